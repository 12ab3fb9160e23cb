//! Application wiring
//!
//! Builds the shared services once at startup and registers them, together
//! with every route, on each actix-web worker.

use crate::handlers::configure_services;
use crate::oauth::{OAuthAuthenticationService, OAuthAuthenticationServiceImpl, OAuthConfig};
use crate::session::SessionManager;
use crate::settings::GatekeepSettings;
use actix_web::{middleware::DefaultHeaders, web};
use anyhow::Result;
use std::sync::Arc;

/// HSTS policy sent when TLS is terminated in-process
const HSTS_VALUE: &str = "max-age=15552000; includeSubDomains";

/// Immutable services shared by every worker
#[derive(Clone)]
pub struct AppServices {
    settings: web::Data<GatekeepSettings>,
    session_manager: web::Data<SessionManager>,
    oauth_service: web::Data<dyn OAuthAuthenticationService>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        settings: GatekeepSettings,
        session_manager: SessionManager,
        oauth_service: Arc<dyn OAuthAuthenticationService>,
    ) -> Self {
        Self {
            settings: web::Data::new(settings),
            session_manager: web::Data::new(session_manager),
            oauth_service: web::Data::from(oauth_service),
        }
    }

    /// Build every service from the loaded settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `CLIENT_ID`, `CLIENT_SECRET` or the signing keys are missing
    /// - A provider endpoint is invalid
    /// - The session lifetime is out of range
    pub fn from_settings(settings: GatekeepSettings) -> Result<Self> {
        settings.validate()?;
        let credentials = settings.credentials()?;
        let oauth_config = OAuthConfig::from_settings(&settings, &credentials)?;
        let session_manager = SessionManager::from_credentials(
            &credentials,
            settings.cookies.secure,
            settings.session.session_duration_hours,
        )?;

        log::info!(
            "Session cookies: {} signing key(s), ttl {}h, secure={}",
            credentials.signing_keys().len(),
            settings.session.session_duration_hours,
            settings.cookies.secure
        );

        Ok(Self::new(
            settings,
            session_manager,
            Arc::new(OAuthAuthenticationServiceImpl::new(oauth_config)),
        ))
    }

    #[must_use]
    pub fn settings(&self) -> &GatekeepSettings {
        &self.settings
    }

    #[must_use]
    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Register shared data and routes on one worker's app
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.settings.clone())
            .app_data(self.session_manager.clone())
            .app_data(self.oauth_service.clone());
        configure_services(cfg);
    }
}

/// Security headers added to every response
#[must_use]
pub fn security_headers(tls_enabled: bool) -> DefaultHeaders {
    let headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Content-Security-Policy", "default-src 'self'"));

    if tls_enabled {
        headers.add(("Strict-Transport-Security", HSTS_VALUE))
    } else {
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{call_service, init_service, TestRequest};
    use actix_web::App;

    fn services() -> AppServices {
        let mut settings = GatekeepSettings::default();
        settings.provider.client_id = Some("id".to_string());
        settings.provider.client_secret = Some("secret".to_string());
        settings.session.cookie_keys = vec!["app-test-key".to_string()];
        AppServices::from_settings(settings).unwrap()
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let mut settings = GatekeepSettings::default();
        settings.session.cookie_keys = vec!["k".to_string()];
        let err = AppServices::from_settings(settings).err().unwrap();
        assert!(err.to_string().contains("CLIENT_ID"));
    }

    #[test]
    fn test_from_settings_rejects_zero_session_lifetime() {
        let mut settings = services().settings().clone();
        settings.session.session_duration_hours = 0;
        let err = AppServices::from_settings(settings).err().unwrap();
        assert!(err.to_string().contains("SESSION_DURATION_HOURS"));
    }

    #[actix_web::test]
    async fn test_security_headers_applied() {
        let services = services();
        let app = init_service(
            App::new()
                .wrap(security_headers(true))
                .configure(|cfg| services.configure(cfg)),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/ping").to_request()).await;
        assert!(resp.status().is_success());

        let headers = resp.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(headers.get("strict-transport-security").unwrap(), HSTS_VALUE);
    }

    #[actix_web::test]
    async fn test_no_hsts_without_tls() {
        let services = services();
        let app = init_service(
            App::new()
                .wrap(security_headers(false))
                .configure(|cfg| services.configure(cfg)),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/failure").to_request()).await;
        assert!(resp.headers().get("strict-transport-security").is_none());
        assert!(resp.headers().get("content-security-policy").is_some());
    }
}
