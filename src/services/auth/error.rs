use thiserror::Error;

/// Transport-agnostic classification of an authorization failure.
///
/// The HTTP boundary maps this to a status code; nothing below it knows about HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The caller must (re-)authenticate.
    Unauthenticated,
    /// The caller is authenticated but lacks privilege.
    Forbidden,
    /// The trust root (identity provider) is unreachable.
    Unavailable,
}

/// Every way an authorization check can fail. Each variant is terminal for the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header (expected '<scheme> <token>')")]
    MalformedHeader,

    #[error("unsupported authorization scheme (expected Bearer)")]
    UnsupportedScheme,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("identity provider public key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MissingHeader
            | Self::MalformedHeader
            | Self::UnsupportedScheme
            | Self::InvalidToken(_) => FailureClass::Unauthenticated,
            Self::Forbidden(_) => FailureClass::Forbidden,
            Self::KeyUnavailable(_) => FailureClass::Unavailable,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(e.to_string())
    }
}
