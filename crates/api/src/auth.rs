//! Token and user identity checks for the intake API.
//!
//! The expected token is resolved once at startup and passed in; nothing here
//! reads the environment.

/// Header carrying the identity of the submitting user.
///
/// The identity provider sits in front of this service; by the time a request
/// arrives the user has been authenticated and this header names them.
pub const USER_HEADER: &str = "x-user-id";

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No API token was configured at startup
    #[error("API token not configured")]
    TokenNotConfigured,
    /// The Authorization header was missing, malformed or wrong
    #[error("Invalid API token")]
    InvalidToken,
    /// The user identity header was missing or blank
    #[error("Missing user identity")]
    MissingUser,
}

/// Validates the bearer token in an Authorization header value against the
/// token configured at startup.
///
/// Returns `Ok(())` if the token matches, or an error if the service has no
/// token configured or the header does not carry the expected value.
pub fn validate_token(
    configured: Option<&str>,
    authorization: Option<&str>,
) -> Result<(), AuthError> {
    let expected = configured.ok_or(AuthError::TokenNotConfigured)?;
    let provided = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::InvalidToken)?;

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

/// Extracts the submitting user from the identity header value.
///
/// Blank and whitespace-only values count as missing.
pub fn user_identity(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingUser)
}
