/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cloned per request; internals are Arc so clones are cheap
 */
use std::sync::Arc;

use crate::services::auth::Authorizer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<Authorizer>,
}

impl AppState {
    pub fn new(auth: Arc<Authorizer>) -> Self {
        Self { auth }
    }
}
