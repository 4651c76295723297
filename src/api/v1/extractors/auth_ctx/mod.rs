/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authorized request context (AuthCtx) to handlers
 * - axum-specific code lives in core; the type itself lives in types
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
