//! OAuth authentication service
//!
//! The service runs the provider side of the flow: it builds the authorization
//! redirect and turns a callback code into a user profile. It has no knowledge
//! of cookies or sessions.

use crate::models::UserProfile;
use crate::oauth::pkce::{generate_code_challenge, generate_code_verifier};
use crate::oauth::{OAuthConfig, OAuthState};
use crate::utils::crypto::generate_csrf_token;
use async_trait::async_trait;
use thiserror::Error;

/// OAuth authentication errors
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error("Profile retrieval failed: {0}")]
    ProfileFetch(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result of OAuth flow initiation
#[derive(Debug, Clone)]
pub struct OAuthFlowResult {
    pub authorization_url: String,
    pub oauth_state: OAuthState,
}

/// OAuth authentication service trait
#[async_trait]
pub trait OAuthAuthenticationService: Send + Sync {
    /// Start a sign-in attempt with a fresh CSRF state and PKCE verifier
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration cannot produce a URL
    fn initiate_oauth_flow(&self) -> Result<OAuthFlowResult, OAuthError>;

    /// Exchange the callback code and fetch the signed-in user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code exchange is rejected or times out
    /// - The profile request fails or returns an error payload
    async fn process_oauth_callback(
        &self,
        authorization_code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, OAuthError>;
}

/// OAuth authentication service backed by the configured provider
pub struct OAuthAuthenticationServiceImpl {
    config: OAuthConfig,
}

impl OAuthAuthenticationServiceImpl {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl OAuthAuthenticationService for OAuthAuthenticationServiceImpl {
    fn initiate_oauth_flow(&self) -> Result<OAuthFlowResult, OAuthError> {
        let oauth_state = OAuthState {
            state: generate_csrf_token(),
            code_verifier: generate_code_verifier(),
        };
        let challenge = generate_code_challenge(&oauth_state.code_verifier);
        let authorization_url = self.config.authorization_url(&oauth_state.state, &challenge);

        Ok(OAuthFlowResult {
            authorization_url,
            oauth_state,
        })
    }

    async fn process_oauth_callback(
        &self,
        authorization_code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, OAuthError> {
        let tokens = self
            .config
            .exchange_code(authorization_code, code_verifier)
            .await?;
        self.config.fetch_profile(&tokens.access_token).await
    }
}
