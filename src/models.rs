use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Profile returned by the identity provider's userinfo endpoint
///
/// `sub` is the provider's stable user identifier. Fields the application
/// does not use directly are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Profile carrying only an identifier
    #[must_use]
    pub fn with_id(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            email_verified: None,
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
            locale: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Signed payload carried in the session cookie
///
/// Only the stable identifier and the token's lifetime are stored; the
/// rest of the profile never leaves the callback handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity reconstructed from a verified session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrincipal {
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionPrincipal {
    /// Build a principal from verified claims, `None` if a timestamp is out of range
    #[must_use]
    pub fn from_claims(claims: SessionClaims) -> Option<Self> {
        Some(Self {
            user_id: claims.sub,
            issued_at: Utc.timestamp_opt(claims.iat, 0).single()?,
            expires_at: Utc.timestamp_opt(claims.exp, 0).single()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
