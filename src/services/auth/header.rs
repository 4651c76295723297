//! `Authorization` header parsing.

use super::AuthError;

/// Extract the raw token from `"<scheme> <token>"`.
///
/// - absent or blank header => `MissingHeader`
/// - anything but exactly two whitespace-separated parts => `MalformedHeader`
/// - scheme other than `bearer` (case-insensitive) => `UnsupportedScheme`
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(AuthError::MalformedHeader),
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::UnsupportedScheme);
    }

    Ok(token)
}
