//! Signed session tokens
//!
//! A token is `base64url(json claims) "." base64url(hmac-sha256)`. New tokens
//! are signed with the first configured key; verification accepts any
//! configured key so keys can be rotated without logging users out.

use crate::models::{SessionClaims, SessionPrincipal, UserProfile};
use crate::utils::crypto::{sign_hmac_sha256, verify_hmac_sha256};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};

#[derive(Clone)]
pub struct SessionCodec {
    signing_keys: Vec<Vec<u8>>,
    ttl: Duration,
}

impl SessionCodec {
    /// Create a codec from an ordered, non-empty key list
    ///
    /// # Errors
    ///
    /// Returns an error if no key is supplied
    pub fn new<K: AsRef<[u8]>>(signing_keys: &[K], ttl: Duration) -> Result<Self> {
        if signing_keys.is_empty() {
            return Err(anyhow!("At least one session signing key is required"));
        }
        Ok(Self {
            signing_keys: signing_keys.iter().map(|k| k.as_ref().to_vec()).collect(),
            ttl,
        })
    }

    /// Session lifetime applied to new tokens
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Key used to sign new sessions
    #[must_use]
    pub fn primary_key(&self) -> &[u8] {
        &self.signing_keys[0]
    }

    /// Encode a session for the given principal, valid for the configured TTL
    ///
    /// # Errors
    ///
    /// Returns an error if the principal has an empty identifier or signing fails
    pub fn encode(&self, profile: &UserProfile) -> Result<String> {
        if profile.sub.is_empty() {
            return Err(anyhow!("Cannot create a session without a user identifier"));
        }
        let now = Utc::now();
        self.encode_claims(&SessionClaims {
            sub: profile.sub.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    /// Sign arbitrary claims with the primary key
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or signing fails
    pub fn encode_claims(&self, claims: &SessionClaims) -> Result<String> {
        let payload = serde_json::to_vec(claims).context("Failed to serialize session claims")?;
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload);
        let signature = sign_hmac_sha256(payload_b64.as_bytes(), self.primary_key())?;
        Ok(format!("{payload_b64}.{signature}"))
    }

    /// Decode and verify a token
    ///
    /// Any failure (malformed, unsigned, signed with an unknown key, expired,
    /// or carrying an empty identifier) yields `None`.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<SessionPrincipal> {
        let Some((payload_b64, signature)) = token.split_once('.') else {
            log::debug!("Session token is malformed");
            return None;
        };

        let verified = self
            .signing_keys
            .iter()
            .any(|key| verify_hmac_sha256(payload_b64.as_bytes(), signature, key));
        if !verified {
            log::debug!("Session token signature did not match any configured key");
            return None;
        }

        let claims: SessionClaims = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())?;

        if claims.sub.is_empty() {
            return None;
        }
        if claims.exp <= Utc::now().timestamp() {
            log::debug!("Session token expired at {}", claims.exp);
            return None;
        }

        SessionPrincipal::from_claims(claims)
    }
}
