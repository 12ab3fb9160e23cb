//! Mock identity provider for isolated handler tests

use crate::models::UserProfile;
use crate::oauth::{
    OAuthAuthenticationService, OAuthConfig, OAuthError, OAuthFlowResult, OAuthState,
};
use crate::oauth::pkce::{generate_code_challenge, generate_code_verifier};
use crate::utils::crypto::generate_csrf_token;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::fixtures::TestFixtures;

/// In-memory provider that accepts exactly one authorization code
///
/// Authorization URLs are built by a real [`OAuthConfig`], so redirects look
/// like the production ones. Every callback is counted, which lets tests
/// assert that rejected callbacks never reach the provider.
#[derive(Clone)]
pub struct MockOAuthService {
    config: OAuthConfig,
    valid_code: String,
    profile: UserProfile,
    callback_calls: Arc<AtomicUsize>,
}

impl MockOAuthService {
    /// Provider that returns `profile` for `valid_code` and rejects any other code
    ///
    /// # Panics
    ///
    /// Panics if the fixture settings do not produce a valid `OAuthConfig`
    #[must_use]
    pub fn accepting(valid_code: &str, profile: UserProfile) -> Self {
        let config =
            OAuthConfig::from_settings(&TestFixtures::settings(), &TestFixtures::credentials())
                .unwrap();
        Self {
            config,
            valid_code: valid_code.to_string(),
            profile,
            callback_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the code exchange was attempted
    #[must_use]
    pub fn callback_calls(&self) -> usize {
        self.callback_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthAuthenticationService for MockOAuthService {
    fn initiate_oauth_flow(&self) -> Result<OAuthFlowResult, OAuthError> {
        let oauth_state = OAuthState {
            state: generate_csrf_token(),
            code_verifier: generate_code_verifier(),
        };
        let challenge = generate_code_challenge(&oauth_state.code_verifier);
        Ok(OAuthFlowResult {
            authorization_url: self.config.authorization_url(&oauth_state.state, &challenge),
            oauth_state,
        })
    }

    async fn process_oauth_callback(
        &self,
        authorization_code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, OAuthError> {
        self.callback_calls.fetch_add(1, Ordering::SeqCst);

        if code_verifier.is_empty() {
            return Err(OAuthError::Exchange("missing code_verifier".to_string()));
        }
        if authorization_code != self.valid_code {
            return Err(OAuthError::Exchange(
                "Token endpoint returned 400 Bad Request: invalid_grant".to_string(),
            ));
        }
        Ok(self.profile.clone())
    }
}
