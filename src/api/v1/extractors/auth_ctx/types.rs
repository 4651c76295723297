/*
 * Responsibility
 * - The "authorized context" type visible to handlers
 * - The middleware verifies and stores it in request extensions; handlers only receive this type
 */

use crate::services::auth::RoleSet;

/// Context attached to an authorized request.
///
/// - `roles` is the full role set found in the token, not only the role the gate checked,
///   so handlers can branch on finer distinctions.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub roles: RoleSet,
}

impl AuthCtx {
    pub fn new(roles: RoleSet) -> Self {
        Self { roles }
    }
}
