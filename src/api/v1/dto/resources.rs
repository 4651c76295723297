use serde::Serialize;

use crate::services::auth::RoleSet;

/// Body returned by the role-protected resources.
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub message: &'static str,
    pub roles: RoleSet,
}
