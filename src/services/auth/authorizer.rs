use std::fmt;

use crate::services::auth::{
    AuthError, RolePredicate, RoleSet, RoleSource, TokenVerifier, extract_roles, require,
};

/// Full pipeline: header -> verified claims -> roles -> gate decision.
///
/// Shared read-only across requests (the process holds one behind an `Arc`).
#[derive(Clone)]
pub struct Authorizer {
    verifier: TokenVerifier,
    role_source: RoleSource,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("verifier", &self.verifier)
            .field("role_source", &self.role_source)
            .finish()
    }
}

impl Authorizer {
    pub fn new(verifier: TokenVerifier, role_source: RoleSource) -> Self {
        Self {
            verifier,
            role_source,
        }
    }

    /// Verify the token and collect its roles without applying a predicate.
    pub async fn roles(&self, header: Option<&str>) -> Result<RoleSet, AuthError> {
        let claims = self.verifier.verify(header).await?;
        Ok(extract_roles(&claims, self.role_source))
    }

    /// Verify the token and require `predicate`; returns the full role set on success.
    pub async fn authorize(
        &self,
        header: Option<&str>,
        predicate: &RolePredicate,
    ) -> Result<RoleSet, AuthError> {
        let roles = self.roles(header).await?;
        require(roles, predicate).into_result()
    }
}
