//! OAuth2 Authorization Code flow against the identity provider
//!
//! `config` talks to the provider's endpoints, `service` wraps it behind a
//! trait so handlers can be tested with a mock provider.

pub mod config;
pub mod pkce;
pub mod service;

pub use config::OAuthConfig;
pub use service::{
    OAuthAuthenticationService, OAuthAuthenticationServiceImpl, OAuthError, OAuthFlowResult,
};

use subtle::ConstantTimeEq;
use serde::{Deserialize, Serialize};

/// Query parameters the provider sends to the callback endpoint
#[derive(Deserialize, Debug)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Per-attempt flow state, kept encrypted in a temporary cookie between
/// the sign-in redirect and the callback
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthState {
    /// CSRF token echoed back by the provider
    pub state: String,
    /// PKCE verifier presented at the code exchange
    pub code_verifier: String,
}

impl OAuthState {
    /// Compare the stored token with the one returned by the provider
    #[must_use]
    pub fn matches(&self, received_state: &str) -> bool {
        self.state
            .as_bytes()
            .ct_eq(received_state.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_matches() {
        let state = OAuthState {
            state: "abc123".to_string(),
            code_verifier: "v".to_string(),
        };
        assert!(state.matches("abc123"));
        assert!(!state.matches("abc124"));
        assert!(!state.matches("abc"));
        assert!(!state.matches(""));
    }

    #[test]
    fn test_callback_query_parsing() {
        let callback = actix_web::web::Query::<OAuthCallback>::from_query("code=4%2F0Ab&state=xyz")
            .unwrap()
            .into_inner();
        assert_eq!(callback.code.as_deref(), Some("4/0Ab"));
        assert_eq!(callback.state.as_deref(), Some("xyz"));
        assert!(callback.error.is_none());
    }
}
