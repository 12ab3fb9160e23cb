//! Session Manager - stateless signed session handling
//!
//! `SessionManager` is the single entry point for turning a principal into
//! a session cookie and back. It owns the [`SessionCodec`] for signing and
//! verifying tokens and the [`CookieFactory`] for cookie attributes. There is
//! no server-side session table: every request is decoded from its own
//! cookie.

use crate::models::{SessionPrincipal, UserProfile};
use crate::oauth::OAuthState;
use crate::session::codec::SessionCodec;
use crate::session::cookie::{CookieFactory, COOKIE_NAME, OAUTH_STATE_COOKIE};
use crate::settings::{Credentials, MAX_SESSION_DURATION_HOURS};
use crate::utils::crypto::{decrypt_data, derive_encryption_key};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::HttpRequest;
use anyhow::{anyhow, Result};
use chrono::Duration;

#[derive(Clone)]
pub struct SessionManager {
    codec: SessionCodec,
    cookie_factory: CookieFactory,
}

// =============================================================================
// Construction
// =============================================================================

impl SessionManager {
    /// Create a session manager from ordered signing keys
    ///
    /// # Errors
    ///
    /// Returns an error if `signing_keys` is empty or the session lifetime is
    /// outside `1..=MAX_SESSION_DURATION_HOURS`
    pub fn new<K: AsRef<[u8]>>(
        signing_keys: &[K],
        cookie_secure: bool,
        session_duration_hours: u64,
    ) -> Result<Self> {
        if !(1..=MAX_SESSION_DURATION_HOURS).contains(&session_duration_hours) {
            return Err(anyhow!(
                "Session lifetime of {session_duration_hours}h is out of range"
            ));
        }
        let hours = i64::try_from(session_duration_hours)?;
        let codec = SessionCodec::new(signing_keys, Duration::hours(hours))?;
        let cookie_factory = CookieFactory::new(
            derive_encryption_key(codec.primary_key()),
            cookie_secure,
            CookieDuration::hours(hours),
        );

        Ok(Self {
            codec,
            cookie_factory,
        })
    }

    /// Create a session manager from the startup credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials carry no signing key
    pub fn from_credentials(
        credentials: &Credentials,
        cookie_secure: bool,
        session_duration_hours: u64,
    ) -> Result<Self> {
        Self::new(
            credentials.signing_keys(),
            cookie_secure,
            session_duration_hours,
        )
    }
}

// =============================================================================
// Session lifecycle
// =============================================================================

impl SessionManager {
    /// Encode a principal into a signed session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if the principal has no identifier or signing fails
    pub fn create_session_cookie(&self, profile: &UserProfile) -> Result<Cookie<'static>> {
        let token = self.codec.encode(profile)?;
        Ok(self.cookie_factory.create_session_cookie(token))
    }

    /// Reconstruct the principal from the request's session cookie
    ///
    /// Returns `None` for a missing, malformed, expired or unverifiable cookie.
    #[must_use]
    pub fn get_principal_from_request(&self, req: &HttpRequest) -> Option<SessionPrincipal> {
        let cookie = req.cookie(COOKIE_NAME)?;
        self.codec.decode(cookie.value())
    }

    /// Cookie that removes the session from the browser
    ///
    /// Safe to send whether or not a session exists.
    #[must_use]
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_cookie()
    }
}

// =============================================================================
// Temporary OAuth state
// =============================================================================

impl SessionManager {
    /// Encrypt the per-attempt OAuth state into a short-lived cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_temporary_state_cookie(&self, oauth_state: &OAuthState) -> Result<Cookie<'static>> {
        self.cookie_factory.create_temporary_state_cookie(oauth_state)
    }

    /// Read the OAuth state stored by the sign-in redirect
    ///
    /// Returns `None` if the cookie is missing or cannot be decrypted.
    #[must_use]
    pub fn get_temporary_state_from_request(&self, req: &HttpRequest) -> Option<OAuthState> {
        crate::session::cookie::log_cookies(req);

        let Some(cookie) = req.cookie(OAUTH_STATE_COOKIE) else {
            log::warn!("No temporary state cookie '{OAUTH_STATE_COOKIE}' found in request");
            return None;
        };

        match decrypt_data::<OAuthState>(cookie.value(), self.cookie_factory.state_encryption_key()) {
            Ok(oauth_state) => Some(oauth_state),
            Err(e) => {
                log::warn!("Failed to decrypt OAuth state cookie: {e}");
                None
            }
        }
    }

    #[must_use]
    pub fn create_expired_temp_state_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_temp_state_cookie()
    }
}

// =============================================================================
// Utilities
// =============================================================================

impl SessionManager {
    #[must_use]
    pub const fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    #[must_use]
    pub const fn cookie_factory(&self) -> &CookieFactory {
        &self.cookie_factory
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_factory.cookie_secure()
    }
}
