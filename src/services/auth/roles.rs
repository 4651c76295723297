use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::services::auth::ClaimSet;

/// Which claim locations contribute roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// `realm_access.roles` plus `resource_access.<client>.roles` for every client.
    RealmAndClients,
    /// `realm_access.roles` only.
    RealmOnly,
}

impl FromStr for RoleSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "realm_and_clients" | "all" => Ok(Self::RealmAndClients),
            "realm_only" | "realm" => Ok(Self::RealmOnly),
            other => Err(format!("unknown role source '{}'", other)),
        }
    }
}

/// Roles discovered in a token. May be empty; may contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn contains(&self, role: &str) -> bool {
        self.iter().any(|r| r == role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// `{"roles": ["A", "B"]}` -> ["A", "B"]; anything ill-shaped contributes nothing.
fn nested_roles(container: &Value) -> impl Iterator<Item = &str> {
    container
        .get("roles")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// Aggregate role strings from the claim set. Never fails.
pub fn extract_roles(claims: &ClaimSet, source: RoleSource) -> RoleSet {
    let mut roles = Vec::new();

    if let Some(realm_access) = claims.get("realm_access") {
        roles.extend(nested_roles(realm_access).map(str::to_string));
    }

    if source == RoleSource::RealmAndClients {
        if let Some(clients) = claims.get("resource_access").and_then(Value::as_object) {
            for client in clients.values() {
                roles.extend(nested_roles(client).map(str::to_string));
            }
        }
    }

    RoleSet(roles)
}
