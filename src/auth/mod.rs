//! Session authentication. The core never decodes the external
//! platform's real session tokens; it depends on an injected
//! [`SessionVerifier`] exactly the way the room membership store and
//! question bank are injected collaborators, not ambient globals.

mod hmac_verifier;

pub use hmac_verifier::HmacSessionVerifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::protocol::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
}

/// Translates an opaque bearer token into `(userId, expiry)`. The core
/// treats this as total and deterministic: same token in, same result out,
/// every time, with no knowledge of the token's internal structure.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(UserId, DateTime<Utc>), AuthError>;
}

/// Pulls a bearer token out of either the `Authorization: Bearer …` header
/// or a `?token=` query parameter, preferring the header when both are
/// present.
pub fn extract_bearer_token(
    authorization_header: Option<&str>,
    query_token: Option<&str>,
) -> Option<String> {
    if let Some(header) = authorization_header {
        if let Some(token) = header.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    query_token
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_header_over_query() {
        let token = extract_bearer_token(Some("Bearer abc"), Some("def"));
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_query_param() {
        let token = extract_bearer_token(None, Some("def"));
        assert_eq!(token.as_deref(), Some("def"));
    }

    #[test]
    fn missing_both_yields_none() {
        assert_eq!(extract_bearer_token(None, None), None);
    }

    #[test]
    fn ignores_non_bearer_scheme() {
        let token = extract_bearer_token(Some("Basic abc"), Some("def"));
        assert_eq!(token.as_deref(), Some("def"));
    }
}
