//! Bearer token verification + role gate -> AuthCtx in request extensions.
//!
//! Each protected route group gets its own `RolePredicate`:
//! ```ignore
//! let admin = Router::new().route("/admin/resource", get(admin_resource));
//! let admin = middleware::auth::access::require(admin, state.clone(), RolePredicate::admin());
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthError, RolePredicate};
use crate::state::AppState;

#[derive(Clone)]
struct Guard {
    state: AppState,
    predicate: Arc<RolePredicate>,
}

/// Apply the access gate to every route currently in `router`.
///
/// `route_layer` so that unmatched paths still 404 instead of 401.
pub fn require(
    router: Router<AppState>,
    state: AppState,
    predicate: RolePredicate,
) -> Router<AppState> {
    let guard = Guard {
        state,
        predicate: Arc::new(predicate),
    };
    // axum 0.8: `from_fn` cannot take a State extractor, so the guard is passed via `from_fn_with_state`
    router.route_layer(middleware::from_fn_with_state(guard, access_middleware))
}

async fn access_middleware(
    State(guard): State<Guard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // A header that is not valid visible ASCII cannot carry a bearer token.
    // Owned copy: the request must not stay borrowed across the key fetch.
    let auth = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(v) => Some(
            v.to_str()
                .map_err(|_| AppError::from(AuthError::MalformedHeader))?
                .to_owned(),
        ),
    };

    let roles = match guard
        .state
        .auth
        .authorize(auth.as_deref(), &guard.predicate)
        .await
    {
        Ok(roles) => roles,
        Err(err @ AuthError::KeyUnavailable(_)) => {
            tracing::error!(error = %err, "identity provider key unavailable");
            return Err(err.into());
        }
        Err(err @ AuthError::Forbidden(_)) => {
            tracing::info!(error = %err, predicate = ?guard.predicate, "access denied");
            return Err(err.into());
        }
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(err.into());
        }
    };

    // handed to the AuthCtx extractor
    req.extensions_mut().insert(AuthCtx::new(roles));

    Ok(next.run(req).await)
}
