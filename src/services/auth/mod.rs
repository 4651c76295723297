pub mod authorizer;
pub mod cached_key_provider;
pub mod error;
pub mod factory;
pub mod gate;
pub mod header;
pub mod key_provider;
pub mod roles;
pub mod verifier;

pub use authorizer::Authorizer;
pub use cached_key_provider::CachedKeyProvider;
pub use error::{AuthError, FailureClass};
pub use factory::build_authorizer;
pub use gate::{AccessDecision, ROLE_ADMIN, ROLE_USER, RolePredicate, require};
pub use header::bearer_token;
pub use key_provider::{KeyProvider, RealmKeyProvider, SigningKey};
pub use roles::{RoleSet, RoleSource, extract_roles};
pub use verifier::{ClaimSet, TokenVerifier, VerificationPolicy, VerifyMode};
