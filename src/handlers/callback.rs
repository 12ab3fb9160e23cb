use crate::oauth::{OAuthAuthenticationService, OAuthCallback, OAuthState};
use crate::session::SessionManager;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpRequest, HttpResponse};

/// Handle the provider redirect after sign-in
///
/// On success the session cookie is set and the user is sent to `/`. Any
/// failure sends the user to `/failure`; the reason is logged, never shown.
/// The temporary state cookie is cleared either way.
pub async fn google_callback(
    req: HttpRequest,
    oauth_service: web::Data<dyn OAuthAuthenticationService>,
    session_manager: web::Data<SessionManager>,
) -> HttpResponse {
    let query = match web::Query::<OAuthCallback>::from_query(req.query_string()) {
        Ok(query) => query.into_inner(),
        Err(e) => {
            return reject_callback(&session_manager, &format!("malformed callback query: {e}"))
        }
    };
    let stored_state = session_manager.get_temporary_state_from_request(&req);

    let (code, oauth_state) = match validate_callback(&query, stored_state) {
        Ok(validated) => validated,
        Err(reason) => return reject_callback(&session_manager, &reason),
    };

    let profile = match oauth_service
        .process_oauth_callback(&code, &oauth_state.code_verifier)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("OAuth callback processing failed: {e}");
            return failure_response(&session_manager, &e.to_string());
        }
    };

    match session_manager.create_session_cookie(&profile) {
        Ok(session_cookie) => {
            LoggingHelper::log_session_created(&profile.sub);
            ResponseBuilder::redirect_with_cookies(
                "/",
                vec![
                    session_cookie,
                    session_manager.create_expired_temp_state_cookie(),
                ],
            )
        }
        Err(e) => {
            log::error!("Failed to create session cookie: {e}");
            failure_response(&session_manager, "session creation failed")
        }
    }
}

/// Check the callback parameters against the stored flow state
///
/// Returns the authorization code and the stored state, or the reason the
/// callback is rejected. Runs before any call to the provider.
fn validate_callback(
    callback: &OAuthCallback,
    stored_state: Option<OAuthState>,
) -> Result<(String, OAuthState), String> {
    if let Some(error) = &callback.error {
        return Err(format!("provider returned error '{error}'"));
    }

    let received_state = callback
        .state
        .as_deref()
        .ok_or_else(|| "missing state parameter".to_string())?;
    let stored_state = stored_state.ok_or_else(|| "no stored OAuth state".to_string())?;
    if !stored_state.matches(received_state) {
        return Err("state mismatch".to_string());
    }

    let code = callback
        .code
        .clone()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| "missing authorization code".to_string())?;

    Ok((code, stored_state))
}

/// Rejected before the provider was contacted; an existing session is kept
fn reject_callback(session_manager: &SessionManager, reason: &str) -> HttpResponse {
    LoggingHelper::log_callback_rejected(reason);
    ResponseBuilder::redirect_with_cookies(
        "/failure",
        vec![session_manager.create_expired_temp_state_cookie()],
    )
}

/// Sign-in failed after state validation; no session survives it
fn failure_response(session_manager: &SessionManager, reason: &str) -> HttpResponse {
    LoggingHelper::log_callback_rejected(reason);
    ResponseBuilder::redirect_with_cookies(
        "/failure",
        vec![
            session_manager.create_expired_temp_state_cookie(),
            session_manager.clear_session_cookie(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> OAuthCallback {
        OAuthCallback {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    fn stored(state: &str) -> Option<OAuthState> {
        Some(OAuthState {
            state: state.to_string(),
            code_verifier: "verifier".to_string(),
        })
    }

    #[test]
    fn test_valid_callback() {
        let (code, state) =
            validate_callback(&callback(Some("abc"), Some("s1"), None), stored("s1")).unwrap();
        assert_eq!(code, "abc");
        assert_eq!(state.code_verifier, "verifier");
    }

    #[test]
    fn test_provider_error_wins() {
        let err = validate_callback(
            &callback(Some("abc"), Some("s1"), Some("access_denied")),
            stored("s1"),
        )
        .unwrap_err();
        assert!(err.contains("access_denied"));
    }

    #[test]
    fn test_state_checks() {
        assert!(validate_callback(&callback(Some("abc"), None, None), stored("s1")).is_err());
        assert!(validate_callback(&callback(Some("abc"), Some("s1"), None), None).is_err());
        assert_eq!(
            validate_callback(&callback(Some("abc"), Some("s2"), None), stored("s1")).unwrap_err(),
            "state mismatch"
        );
    }

    #[test]
    fn test_missing_code() {
        assert!(validate_callback(&callback(None, Some("s1"), None), stored("s1")).is_err());
        assert!(validate_callback(&callback(Some(""), Some("s1"), None), stored("s1")).is_err());
    }
}
