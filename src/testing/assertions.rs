//! Assertion helpers for responses returned by `test::call_service`

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;

/// Assert that a response is a 302 to `location`
///
/// # Panics
///
/// Panics if the status is not 302 or the `Location` header differs.
pub fn assert_redirect<B>(response: &ServiceResponse<B>, location: &str) {
    assert_eq!(response.status().as_u16(), 302, "expected a redirect");
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some(location),
        "unexpected redirect target"
    );
}

/// Cookie set on a response, by name
#[must_use]
pub fn find_cookie<B>(response: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(Cookie::into_owned)
}

/// Assert that the response sets `name` to a non-empty value
///
/// # Panics
///
/// Panics if the cookie is absent or empty.
pub fn assert_cookie_set<B>(response: &ServiceResponse<B>, name: &str) -> Cookie<'static> {
    let cookie = find_cookie(response, name).unwrap_or_else(|| panic!("cookie {name} not set"));
    assert!(!cookie.value().is_empty(), "cookie {name} is empty");
    cookie
}

/// Assert that the response removes `name` (empty value, negative max-age)
/// or does not mention it at all when `allow_absent` is true
///
/// # Panics
///
/// Panics if the response sets `name` to a live value.
pub fn assert_cookie_cleared<B>(response: &ServiceResponse<B>, name: &str, allow_absent: bool) {
    match find_cookie(response, name) {
        Some(cookie) => {
            assert!(cookie.value().is_empty(), "cookie {name} still has a value");
            assert!(
                cookie
                    .max_age()
                    .is_some_and(|age| age.whole_seconds() <= 0),
                "cookie {name} is not expired"
            );
        }
        None => assert!(allow_absent, "cookie {name} was not cleared"),
    }
}
