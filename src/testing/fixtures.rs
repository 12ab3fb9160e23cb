//! Test fixtures providing pre-built test objects

use crate::app::AppServices;
use crate::models::UserProfile;
use crate::oauth::OAuthAuthenticationService;
use crate::session::SessionManager;
use crate::settings::{Credentials, GatekeepSettings};
use std::sync::Arc;

use super::constants::{
    TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_COOKIE_KEY, TEST_EMAIL, TEST_SUBJECT,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with credentials filled in, TLS off and insecure cookies
    #[must_use]
    pub fn settings() -> GatekeepSettings {
        let mut settings = GatekeepSettings::default();
        settings.tls.enabled = false;
        settings.cookies.secure = false;
        settings.provider.client_id = Some(TEST_CLIENT_ID.to_string());
        settings.provider.client_secret = Some(TEST_CLIENT_SECRET.to_string());
        settings.session.cookie_keys = vec![TEST_COOKIE_KEY.to_string()];
        settings
    }

    /// Settings whose token and userinfo endpoints point at `base_url`
    #[must_use]
    pub fn settings_with_provider(base_url: &str) -> GatekeepSettings {
        let mut settings = Self::settings();
        settings.provider.token_endpoint = format!("{base_url}/token");
        settings.provider.userinfo_endpoint = format!("{base_url}/userinfo");
        settings
    }

    /// Credentials resolved from [`Self::settings`]
    ///
    /// # Panics
    ///
    /// Panics if the fixture settings lack a credential
    #[must_use]
    pub fn credentials() -> Credentials {
        Self::settings().credentials().unwrap()
    }

    /// Session manager signing with the fixture key
    ///
    /// # Panics
    ///
    /// Panics if the session manager cannot be created
    #[must_use]
    pub fn session_manager() -> SessionManager {
        Self::session_manager_with_keys(&[TEST_COOKIE_KEY])
    }

    /// Session manager with an explicit ordered key list
    ///
    /// # Panics
    ///
    /// Panics if `keys` is empty
    #[must_use]
    pub fn session_manager_with_keys(keys: &[&str]) -> SessionManager {
        SessionManager::new(keys, false, 24).unwrap()
    }

    /// A typical provider profile
    #[must_use]
    pub fn profile() -> UserProfile {
        let mut profile = UserProfile::with_id(TEST_SUBJECT);
        profile.email = Some(TEST_EMAIL.to_string());
        profile.email_verified = Some(true);
        profile
    }

    /// Application services backed by the given provider implementation
    #[must_use]
    pub fn services<S>(oauth_service: S) -> AppServices
    where
        S: OAuthAuthenticationService + 'static,
    {
        Self::services_with_manager(oauth_service, Self::session_manager())
    }

    /// Application services with an explicit session manager
    #[must_use]
    pub fn services_with_manager<S>(oauth_service: S, session_manager: SessionManager) -> AppServices
    where
        S: OAuthAuthenticationService + 'static,
    {
        let oauth_service: Arc<dyn OAuthAuthenticationService> = Arc::new(oauth_service);
        AppServices::new(Self::settings(), session_manager, oauth_service)
    }
}
