//! Access guard for protected routes
//!
//! Handlers that take an [`Authenticated`] argument only run for requests
//! carrying a valid session cookie. Everything else is answered with
//! 401 `{"error":"You must log in"}` before the handler is called.

use crate::models::SessionPrincipal;
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;
use actix_web::{dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};
use thiserror::Error;

/// The caller has no usable session
#[derive(Debug, Error)]
#[error("You must log in")]
pub struct AuthRequired;

impl actix_web::ResponseError for AuthRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        ResponseBuilder::auth_required()
    }
}

/// Principal of a request that passed the access guard
#[derive(Debug, Clone)]
pub struct Authenticated(pub SessionPrincipal);

impl Authenticated {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

/// Decide whether a request may proceed
///
/// Allowed only when the session decodes to a principal with a non-empty
/// identifier.
#[must_use]
pub fn check_access(req: &HttpRequest, session_manager: &SessionManager) -> Option<SessionPrincipal> {
    session_manager
        .get_principal_from_request(req)
        .filter(|principal| !principal.user_id.is_empty())
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(session_manager) = req.app_data::<web::Data<SessionManager>>() else {
            log::error!("SessionManager is not registered as application data");
            return ready(Err(actix_web::error::InternalError::from_response(
                "Session handling is not configured",
                ResponseBuilder::server_error(),
            )
            .into()));
        };

        ready(match check_access(req, session_manager) {
            Some(principal) => Ok(Self(principal)),
            None => {
                log::debug!("Denied {} {}: no valid session", req.method(), req.path());
                Err(AuthRequired.into())
            }
        })
    }
}
