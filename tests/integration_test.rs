// End-to-end tests of the sign-in flow, the access guard and the routes,
// with the identity provider replaced by an in-memory mock
use actix_web::{body::to_bytes, http::StatusCode, test, App};
use gatekeep::models::SessionClaims;
use gatekeep::oauth::pkce::generate_code_challenge;
use gatekeep::security_headers;
use gatekeep::session::{COOKIE_NAME, OAUTH_STATE_COOKIE};
use gatekeep::testing::constants::{
    TEST_CLIENT_ID, TEST_COOKIE_KEY, TEST_COOKIE_KEY_OLD, TEST_SUBJECT, TEST_VALID_CODE,
};
use gatekeep::testing::{
    assert_cookie_cleared, assert_cookie_set, assert_redirect, find_cookie, MockOAuthService,
    RequestBuilder, TestFixtures,
};
use std::collections::HashMap;

const SECRET_TEXT: &str = "Your personal secret value is 42!";
const AUTH_REQUIRED_BODY: &str = r#"{"error":"You must log in"}"#;

macro_rules! init_app {
    ($services:expr) => {
        test::init_service(
            App::new()
                .wrap(security_headers(false))
                .configure(|cfg| $services.configure(cfg)),
        )
        .await
    };
}

fn mock() -> MockOAuthService {
    MockOAuthService::accepting(TEST_VALID_CODE, TestFixtures::profile())
}

fn query_params(location: &str) -> HashMap<String, String> {
    url::Url::parse(location)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[actix_web::test]
async fn test_secret_without_cookie_is_rejected() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let resp = test::call_service(&app, RequestBuilder::get("/secret").build().to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = to_bytes(resp.into_body()).await.unwrap();
    assert_eq!(body, AUTH_REQUIRED_BODY);
}

#[actix_web::test]
async fn test_sign_in_redirects_to_provider() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let resp =
        test::call_service(&app, RequestBuilder::get("/auth/google").build().to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let location = resp
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));

    let params = query_params(&location);
    assert_eq!(params["client_id"], TEST_CLIENT_ID);
    assert_eq!(
        params["redirect_uri"],
        "https://localhost:3000/auth/google/callback"
    );
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "email");
    assert_eq!(params["code_challenge_method"], "S256");

    // The encrypted state cookie holds the same state and the verifier for the challenge
    let state_cookie = assert_cookie_set(&resp, OAUTH_STATE_COOKIE);
    let req = RequestBuilder::get("/")
        .cookie(state_cookie)
        .build()
        .to_http_request();
    let stored = services
        .session_manager()
        .get_temporary_state_from_request(&req)
        .unwrap();
    assert_eq!(stored.state, params["state"]);
    assert_eq!(
        generate_code_challenge(&stored.code_verifier),
        params["code_challenge"]
    );
}

#[actix_web::test]
async fn test_full_login_flow_grants_access() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let sign_in =
        test::call_service(&app, RequestBuilder::get("/auth/google").build().to_request()).await;
    let state = query_params(sign_in.headers().get("location").unwrap().to_str().unwrap())
        ["state"]
        .clone();
    let state_cookie = find_cookie(&sign_in, OAUTH_STATE_COOKIE);

    let callback = test::call_service(
        &app,
        RequestBuilder::get("/auth/google/callback")
            .query("code", TEST_VALID_CODE)
            .query("state", &state)
            .maybe_cookie(state_cookie)
            .build()
            .to_request(),
    )
    .await;
    assert_redirect(&callback, "/");
    let session_cookie = assert_cookie_set(&callback, COOKIE_NAME);
    assert_cookie_cleared(&callback, OAUTH_STATE_COOKIE, false);
    assert_eq!(session_cookie.http_only(), Some(true));
    assert_eq!(session_cookie.path(), Some("/"));
    assert_eq!(
        session_cookie.max_age().map(|age| age.whole_hours()),
        Some(24)
    );

    let secret = test::call_service(
        &app,
        RequestBuilder::get("/secret")
            .cookie(session_cookie)
            .build()
            .to_request(),
    )
    .await;
    assert_eq!(secret.status(), StatusCode::OK);
    let body = to_bytes(secret.into_body()).await.unwrap();
    assert_eq!(body, SECRET_TEXT);
}

#[actix_web::test]
async fn test_session_cookie_carries_only_the_subject() {
    let services = TestFixtures::services(mock());
    let oauth_state = gatekeep::oauth::OAuthState {
        state: "state-1".to_string(),
        code_verifier: "verifier-1".to_string(),
    };
    let app = init_app!(services);

    let callback = test::call_service(
        &app,
        RequestBuilder::callback(services.session_manager(), &oauth_state, TEST_VALID_CODE)
            .build()
            .to_request(),
    )
    .await;
    let session_cookie = assert_cookie_set(&callback, COOKIE_NAME);

    let req = RequestBuilder::get("/")
        .cookie(session_cookie.clone())
        .build()
        .to_http_request();
    let principal = services
        .session_manager()
        .get_principal_from_request(&req)
        .unwrap();
    assert_eq!(principal.user_id, TEST_SUBJECT);
    assert!(!session_cookie.value().contains("example.com"));
}

#[actix_web::test]
async fn test_invalid_code_redirects_to_failure() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);
    let oauth_state = gatekeep::oauth::OAuthState {
        state: "state-2".to_string(),
        code_verifier: "verifier-2".to_string(),
    };

    let resp = test::call_service(
        &app,
        RequestBuilder::callback(services.session_manager(), &oauth_state, "expired-code")
            .build()
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert_cookie_cleared(&resp, COOKIE_NAME, false);
    assert_cookie_cleared(&resp, OAUTH_STATE_COOKIE, false);
    assert_eq!(mock.callback_calls(), 1);
}

#[actix_web::test]
async fn test_state_mismatch_never_reaches_provider() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);
    let oauth_state = gatekeep::oauth::OAuthState {
        state: "expected-state".to_string(),
        code_verifier: "verifier".to_string(),
    };
    let state_cookie = services
        .session_manager()
        .create_temporary_state_cookie(&oauth_state)
        .unwrap();

    let resp = test::call_service(
        &app,
        RequestBuilder::get("/auth/google/callback")
            .query("code", TEST_VALID_CODE)
            .query("state", "forged-state")
            .cookie(state_cookie)
            .build()
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert!(find_cookie(&resp, COOKIE_NAME).is_none());
    assert_cookie_cleared(&resp, OAUTH_STATE_COOKIE, false);
    assert_eq!(mock.callback_calls(), 0);
}

#[actix_web::test]
async fn test_missing_state_cookie_never_reaches_provider() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);

    let resp = test::call_service(
        &app,
        RequestBuilder::get("/auth/google/callback")
            .query("code", TEST_VALID_CODE)
            .query("state", "some-state")
            .build()
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert_eq!(mock.callback_calls(), 0);
}

#[actix_web::test]
async fn test_malformed_callback_query_redirects_to_failure() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);
    let oauth_state = gatekeep::oauth::OAuthState {
        state: "state-4".to_string(),
        code_verifier: "verifier-4".to_string(),
    };
    let state_cookie = services
        .session_manager()
        .create_temporary_state_cookie(&oauth_state)
        .unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/google/callback?code=a&code=b&state=state-4")
            .cookie(state_cookie)
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert_cookie_cleared(&resp, OAUTH_STATE_COOKIE, false);
    assert_eq!(mock.callback_calls(), 0);
}

#[actix_web::test]
async fn test_forged_callback_keeps_existing_session() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);
    let session_cookie = services
        .session_manager()
        .create_session_cookie(&TestFixtures::profile())
        .unwrap();

    let resp = test::call_service(
        &app,
        RequestBuilder::get("/auth/google/callback")
            .query("code", TEST_VALID_CODE)
            .query("state", "attacker-state")
            .cookie(session_cookie.clone())
            .build()
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert!(find_cookie(&resp, COOKIE_NAME).is_none());
    assert_eq!(mock.callback_calls(), 0);

    let secret = test::call_service(
        &app,
        RequestBuilder::get("/secret")
            .cookie(session_cookie)
            .build()
            .to_request(),
    )
    .await;
    assert_eq!(secret.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_provider_error_redirects_to_failure() {
    let mock = mock();
    let services = TestFixtures::services(mock.clone());
    let app = init_app!(services);
    let oauth_state = gatekeep::oauth::OAuthState {
        state: "state-3".to_string(),
        code_verifier: "verifier-3".to_string(),
    };
    let state_cookie = services
        .session_manager()
        .create_temporary_state_cookie(&oauth_state)
        .unwrap();

    let resp = test::call_service(
        &app,
        RequestBuilder::get("/auth/google/callback")
            .query("error", "access_denied")
            .query("state", "state-3")
            .cookie(state_cookie)
            .build()
            .to_request(),
    )
    .await;

    assert_redirect(&resp, "/failure");
    assert_eq!(mock.callback_calls(), 0);

    let failure =
        test::call_service(&app, RequestBuilder::get("/failure").build().to_request()).await;
    assert_eq!(failure.status(), StatusCode::OK);
    let body = to_bytes(failure.into_body()).await.unwrap();
    assert_eq!(body, "Failed to log in");
}

#[actix_web::test]
async fn test_logout_then_secret_is_rejected() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);
    let session_cookie = services
        .session_manager()
        .create_session_cookie(&TestFixtures::profile())
        .unwrap();

    let logout = test::call_service(
        &app,
        RequestBuilder::get("/auth/logout")
            .cookie(session_cookie)
            .build()
            .to_request(),
    )
    .await;
    assert_redirect(&logout, "/");
    assert_cookie_cleared(&logout, COOKIE_NAME, false);
    let cleared = find_cookie(&logout, COOKIE_NAME);

    // The browser now holds the cleared value
    let secret = test::call_service(
        &app,
        RequestBuilder::get("/secret")
            .maybe_cookie(cleared)
            .build()
            .to_request(),
    )
    .await;
    assert_eq!(secret.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_is_idempotent() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let first =
        test::call_service(&app, RequestBuilder::get("/auth/logout").build().to_request()).await;
    let second =
        test::call_service(&app, RequestBuilder::get("/auth/logout").build().to_request()).await;

    assert_redirect(&first, "/");
    assert_redirect(&second, "/");
    assert_eq!(
        find_cookie(&first, COOKIE_NAME).map(|c| c.to_string()),
        find_cookie(&second, COOKIE_NAME).map(|c| c.to_string())
    );
}

#[actix_web::test]
async fn test_key_rotation_over_http() {
    let old_manager = TestFixtures::session_manager_with_keys(&[TEST_COOKIE_KEY_OLD]);
    let old_cookie = old_manager
        .create_session_cookie(&TestFixtures::profile())
        .unwrap();

    // Old key still configured as secondary
    let rotating = TestFixtures::services_with_manager(
        mock(),
        TestFixtures::session_manager_with_keys(&[TEST_COOKIE_KEY, TEST_COOKIE_KEY_OLD]),
    );
    let app = init_app!(rotating);
    let resp = test::call_service(
        &app,
        RequestBuilder::get("/secret")
            .cookie(old_cookie.clone())
            .build()
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Old key removed
    let retired = TestFixtures::services_with_manager(
        mock(),
        TestFixtures::session_manager_with_keys(&[TEST_COOKIE_KEY]),
    );
    let app = init_app!(retired);
    let resp = test::call_service(
        &app,
        RequestBuilder::get("/secret")
            .cookie(old_cookie)
            .build()
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_expired_session_is_rejected() {
    let services = TestFixtures::services(mock());
    let manager = services.session_manager();
    let now = chrono::Utc::now().timestamp();
    let token = manager
        .codec()
        .encode_claims(&SessionClaims {
            sub: TEST_SUBJECT.to_string(),
            iat: now - 90_000,
            exp: now - 3_600,
        })
        .unwrap();
    let cookie = manager.cookie_factory().create_session_cookie(token);
    let app = init_app!(services);

    let resp = test::call_service(
        &app,
        RequestBuilder::get("/secret").cookie(cookie).build().to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_health_and_security_headers() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let resp = test::call_service(&app, RequestBuilder::get("/ping").build().to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_entry_page_is_served() {
    let services = TestFixtures::services(mock());
    let app = init_app!(services);

    let resp = test::call_service(&app, RequestBuilder::get("/").build().to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body()).await.unwrap();
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("/auth/google"));
}
