//! Default `SessionVerifier`: an HMAC-SHA256 signed token keyed by
//! `SESSION_SECRET`. This is the implementation wired up in `main.rs` for a
//! single-process deployment and the default test double; any other
//! conforming verifier (e.g. one that calls out to the platform's real
//! session store) can be substituted without touching the rest of the
//! gateway.
//!
//! Token shape: `base64url(payload_json).base64url(hmac_tag)` where
//! `payload_json = {"sub": <userId>, "exp": <unix_seconds>}`.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{AuthError, SessionVerifier};
use crate::protocol::UserId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    sub: UserId,
    exp: i64,
}

pub struct HmacSessionVerifier {
    secret: Vec<u8>,
}

impl HmacSessionVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a token for the given user, expiring at `expiry`. Exposed so
    /// tests (and, if ever needed, a companion token-minting service) can
    /// produce tokens this verifier accepts.
    pub fn sign(&self, user_id: UserId, expiry: DateTime<Utc>) -> String {
        let payload = TokenPayload {
            sub: user_id,
            exp: expiry.timestamp(),
        };
        let payload_json = serde_json::to_vec(&payload).expect("TokenPayload is always encodable");
        let payload_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload_json);

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload_b64.as_bytes());
        let tag = mac.finalize().into_bytes();
        let tag_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag);

        format!("{payload_b64}.{tag_b64}")
    }
}

#[async_trait]
impl SessionVerifier for HmacSessionVerifier {
    async fn verify(&self, token: &str) -> Result<(UserId, DateTime<Utc>), AuthError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(AuthError::InvalidToken)?;

        let expected_tag =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(tag_b64).map_err(|_| AuthError::InvalidToken)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload_b64.as_bytes());
        let actual_tag = mac.finalize().into_bytes();

        if actual_tag.ct_eq(&expected_tag).unwrap_u8() != 1 {
            return Err(AuthError::InvalidToken);
        }

        let payload_json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let payload: TokenPayload =
            serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

        let expiry = Utc
            .timestamp_opt(payload.exp, 0)
            .single()
            .ok_or(AuthError::InvalidToken)?;

        if expiry <= Utc::now() {
            return Err(AuthError::Expired);
        }

        Ok((payload.sub, expiry))
    }
}
