//! HTTP response helpers
//!
//! Shared constructors for the redirects and JSON error bodies the handlers
//! return, so every route answers the same failure the same way.

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde_json::json;

/// Body sent to callers that reach a protected route without a session
pub const AUTH_REQUIRED_MESSAGE: &str = "You must log in";

/// Pre-serialized JSON bodies, built once on first use
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

struct CachedResponses {
    auth_required: String,
    server_error: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            auth_required: json!({ "error": AUTH_REQUIRED_MESSAGE }).to_string(),
            server_error: json!({
                "error": "server_error",
                "error_description": "An internal server error occurred"
            })
            .to_string(),
        }
    }
}

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 302 redirect to `location`
    #[must_use]
    pub fn redirect(location: &str) -> HttpResponse {
        Self::redirect_with_cookies(location, Vec::new())
    }

    /// 302 redirect that also sets (or clears) the given cookies
    #[must_use]
    pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();

        for cookie in cookies {
            builder.cookie(cookie);
        }

        builder
            .insert_header((header::LOCATION, location.to_string()))
            .finish()
    }

    /// 401 with `{"error":"You must log in"}`
    #[must_use]
    pub fn auth_required() -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(CACHED_RESPONSES.auth_required.clone())
    }

    /// 500 with a generic JSON error body
    #[must_use]
    pub fn server_error() -> HttpResponse {
        HttpResponse::InternalServerError()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(CACHED_RESPONSES.server_error.clone())
    }

    /// 404 with a JSON error body
    #[must_use]
    pub fn not_found(description: &str) -> HttpResponse {
        HttpResponse::NotFound().json(json!({
            "error": "not_found",
            "error_description": description
        }))
    }

    /// 200 with a plain text body
    #[must_use]
    pub fn text(body: &'static str) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::StatusCode};

    #[actix_web::test]
    async fn test_auth_required_body() {
        let response = ResponseBuilder::auth_required();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, r#"{"error":"You must log in"}"#);
    }

    #[test]
    fn test_redirect_with_cookies() {
        let cookies = vec![Cookie::new("a", "1"), Cookie::new("b", "2")];
        let response = ResponseBuilder::redirect_with_cookies("/failure", cookies);

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/failure");
        assert_eq!(response.cookies().count(), 2);
    }

    #[test]
    fn test_plain_redirect_sets_no_cookie() {
        let response = ResponseBuilder::redirect("/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.cookies().count(), 0);
    }
}
