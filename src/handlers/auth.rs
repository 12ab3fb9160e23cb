// Authentication handlers: sign-in and sign-out
use crate::oauth::OAuthAuthenticationService;
use crate::session::SessionManager;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};

/// Start the Google sign-in flow
///
/// Generates a fresh CSRF state and PKCE verifier, stores both in the
/// encrypted temporary state cookie and redirects to the provider.
pub async fn google_sign_in(
    oauth_service: web::Data<dyn OAuthAuthenticationService>,
    session_manager: web::Data<SessionManager>,
) -> HttpResponse {
    let flow = match oauth_service.initiate_oauth_flow() {
        Ok(flow) => flow,
        Err(e) => {
            error!("Failed to start OAuth flow: {e}");
            return ResponseBuilder::redirect("/failure");
        }
    };

    let state_cookie = match session_manager.create_temporary_state_cookie(&flow.oauth_state) {
        Ok(cookie) => cookie,
        Err(e) => {
            error!("Failed to store OAuth state: {e}");
            return ResponseBuilder::redirect("/failure");
        }
    };

    info!("Redirecting to identity provider for sign-in");
    ResponseBuilder::redirect_with_cookies(&flow.authorization_url, vec![state_cookie])
}

/// Clear the session cookie and return to the entry page
///
/// Idempotent: the same expired cookie is sent whether or not a session
/// exists.
pub async fn sign_out(req: HttpRequest, session_manager: web::Data<SessionManager>) -> HttpResponse {
    LoggingHelper::log_sign_out(session_manager.get_principal_from_request(&req).is_some());
    ResponseBuilder::redirect_with_cookies("/", vec![session_manager.clear_session_cookie()])
}
