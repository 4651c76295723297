use crate::services::auth::{AuthError, RoleSet};

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

/// Role requirement checked by the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePredicate {
    HasAnyOf(Vec<String>),
    Has(String),
}

impl RolePredicate {
    /// has-any-of {USER, ADMIN}
    pub fn user_or_admin() -> Self {
        Self::HasAnyOf(vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()])
    }

    /// has {ADMIN}
    pub fn admin() -> Self {
        Self::Has(ROLE_ADMIN.to_string())
    }

    pub fn is_satisfied_by(&self, roles: &RoleSet) -> bool {
        match self {
            Self::HasAnyOf(any) => any.iter().any(|r| roles.contains(r)),
            Self::Has(role) => roles.contains(role),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::HasAnyOf(any) => any.join(" or "),
            Self::Has(role) => role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(RoleSet),
    Deny { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Allow => the discovered roles; Deny => `AuthError::Forbidden`.
    pub fn into_result(self) -> Result<RoleSet, AuthError> {
        match self {
            Self::Allow(roles) => Ok(roles),
            Self::Deny { reason } => Err(AuthError::Forbidden(reason)),
        }
    }
}

/// Pure set-membership check; the full role set is handed back on success.
pub fn require(roles: RoleSet, predicate: &RolePredicate) -> AccessDecision {
    if predicate.is_satisfied_by(&roles) {
        AccessDecision::Allow(roles)
    } else {
        AccessDecision::Deny {
            reason: format!("token is valid but lacks role {}", predicate.describe()),
        }
    }
}
