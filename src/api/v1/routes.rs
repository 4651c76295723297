/*
 * Responsibility
 * - URL layout of v1
 * - Decide which role predicate guards which route group
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::services::auth::RolePredicate;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    resources::{admin_resource, user_resource},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let user = access::require(
        Router::new().route("/user/resource", get(user_resource)),
        state.clone(),
        RolePredicate::user_or_admin(),
    );

    let admin = access::require(
        Router::new()
            .route("/admin/resource", get(admin_resource))
            .route("/any/resource", get(admin_resource)),
        state,
        RolePredicate::admin(),
    );

    Router::new()
        .route("/health", get(health))
        .merge(user)
        .merge(admin)
}
