//! Request builders for the sign-in flow

use crate::oauth::OAuthState;
use crate::session::SessionManager;
use actix_web::cookie::Cookie;
use actix_web::test;

/// Builder for callback and protected-route requests
#[derive(Default)]
pub struct RequestBuilder {
    uri: String,
    query: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl RequestBuilder {
    /// GET request to `uri`
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            ..Self::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a cookie
    #[must_use]
    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add an optional cookie, usually one taken from a previous response
    #[must_use]
    pub fn maybe_cookie(self, cookie: Option<Cookie<'static>>) -> Self {
        match cookie {
            Some(cookie) => self.cookie(cookie),
            None => self,
        }
    }

    /// Callback request carrying `code`, `state` and the matching state cookie
    ///
    /// # Panics
    ///
    /// Panics if the state cookie cannot be encrypted
    #[must_use]
    pub fn callback(session_manager: &SessionManager, oauth_state: &OAuthState, code: &str) -> Self {
        let state_cookie = session_manager
            .create_temporary_state_cookie(oauth_state)
            .unwrap();
        Self::get("/auth/google/callback")
            .query("code", code)
            .query("state", &oauth_state.state)
            .cookie(state_cookie)
    }

    /// Full request URI including the encoded query string
    #[must_use]
    pub fn full_uri(&self) -> String {
        if self.query.is_empty() {
            return self.uri.clone();
        }
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.query {
            serializer.append_pair(name, value);
        }
        format!("{}?{}", self.uri, serializer.finish())
    }

    /// Build the `TestRequest`; finish with `.to_request()` for `test::call_service`
    #[must_use]
    pub fn build(self) -> test::TestRequest {
        let mut req = test::TestRequest::get().uri(&self.full_uri());
        for cookie in self.cookies {
            req = req.cookie(cookie);
        }
        req
    }
}
