use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;
use serde::Serialize;

use crate::oauth::OAuthState;
use crate::utils::crypto::encrypt_data;

/// Common cookie names used across the application
pub const COOKIE_NAME: &str = "gatekeep_session";
pub const OAUTH_STATE_COOKIE: &str = "gatekeep_oauth_state";

/// Lifetime of the temporary cookie that carries the OAuth state
pub const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: Duration::hours(24),
        }
    }
}

/// Cookie factory for the session and temporary OAuth state cookies
///
/// Cookies are host-only (no `Domain` attribute), so the browser returns
/// them to this origin only.
#[derive(Clone)]
pub struct CookieFactory {
    state_encryption_key: [u8; 32],
    cookie_secure: bool,
    session_max_age: Duration,
}

impl CookieFactory {
    #[must_use]
    pub fn new(
        state_encryption_key: [u8; 32],
        cookie_secure: bool,
        session_max_age: Duration,
    ) -> Self {
        Self {
            state_encryption_key,
            cookie_secure,
            session_max_age,
        }
    }

    /// Create a cookie with the given value and options
    #[must_use]
    pub fn create_cookie(&self, name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Create an encrypted cookie from serializable data
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_encrypted_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.state_encryption_key)?;
        Ok(self.create_cookie(name, value, options))
    }

    /// Wrap an already signed session token in the session cookie
    ///
    /// `SameSite=Lax` so the cookie set on the callback response is sent on
    /// the redirect that follows the provider round trip.
    #[must_use]
    pub fn create_session_cookie(&self, token: String) -> Cookie<'static> {
        self.create_cookie(
            COOKIE_NAME,
            token,
            CookieOptions {
                same_site: SameSite::Lax,
                max_age: self.session_max_age,
                ..Default::default()
            },
        )
    }

    /// Create a temporary cookie for storing OAuth state during the OAuth flow
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_temporary_state_cookie(&self, oauth_state: &OAuthState) -> Result<Cookie<'static>> {
        let cookie = self.create_encrypted_cookie(
            OAUTH_STATE_COOKIE,
            oauth_state,
            CookieOptions {
                same_site: SameSite::Lax,
                max_age: Duration::minutes(OAUTH_STATE_TTL_MINUTES),
                ..Default::default()
            },
        )?;

        log::debug!(
            "Creating temporary state cookie: secure={}, encrypted_len={}",
            self.cookie_secure,
            cookie.value().len()
        );

        Ok(cookie)
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(COOKIE_NAME, self.cookie_secure)
    }

    /// Create an expired cookie to clear the temporary OAuth state
    #[must_use]
    pub fn create_expired_temp_state_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(OAUTH_STATE_COOKIE, self.cookie_secure)
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn state_encryption_key(&self) -> &[u8] {
        &self.state_encryption_key
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(-1))
        .finish()
}

/// Log the names of cookies on a request at debug level
pub fn log_cookies(req: &HttpRequest) {
    if let Ok(cookies) = req.cookies() {
        for cookie in cookies.iter() {
            log::debug!("Found cookie: name='{}'", cookie.name());
        }
    }
}
