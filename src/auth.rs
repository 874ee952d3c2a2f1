//! HS256 bearer-token verification and minting.
//!
//! Tokens carry a single application claim, `user_id`, plus the standard
//! `exp` expiry. Verification distinguishes expiry from every other failure
//! because callers surface the two differently to clients.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token.
///
/// Field names are fixed by the wire format: `user_id` identifies the
/// caller, `exp` is a unix timestamp in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub exp: i64,
}

/// Errors from token verification or minting.
#[derive(Error, Debug, Diagnostic)]
pub enum AuthError {
    /// The token's signature and structure were valid but `exp` has passed.
    #[error("Token expired")]
    #[diagnostic(
        code(agentloom::auth::expired),
        help("Mint a fresh token; the presented one is past its expiry.")
    )]
    Expired,

    /// Any other verification failure: bad signature, malformed token,
    /// missing claims.
    #[error("Invalid token")]
    #[diagnostic(
        code(agentloom::auth::invalid),
        help("Check that the token was signed with the configured secret.")
    )]
    Invalid,

    /// Token minting failed. Practically only reachable with a broken key.
    #[error("failed to sign token: {message}")]
    #[diagnostic(code(agentloom::auth::signing))]
    Signing { message: String },
}

/// Verify an HS256 token and return its `user_id` claim.
///
/// Expiry is validated with the library's default leeway. An expired token
/// maps to [`AuthError::Expired`]; every other failure collapses to
/// [`AuthError::Invalid`] so clients learn nothing about why verification
/// failed.
pub fn verify_token(token: &str, secret: &str) -> Result<String, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.user_id)
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    })
}

/// Mint an HS256 token for `user_id` that expires `ttl` from now.
pub fn issue_token(user_id: &str, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        user_id: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AuthError::Signing {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_user_id() {
        let token = issue_token("user_123", SECRET, Duration::days(30)).unwrap();
        let user_id = verify_token(&token, SECRET).unwrap();
        assert_eq!(user_id, "user_123");
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // Far enough in the past to clear the default validation leeway.
        let token = issue_token("user_123", SECRET, Duration::hours(-2)).unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue_token("user_123", SECRET, Duration::days(1)).unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn garbage_token_is_invalid() {
        let err = verify_token("not-a-jwt", SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
    }
}
