// HTTP request handlers for the login server
pub mod auth;
pub mod callback;
pub mod protected;
pub mod static_files;

use actix_web::web;

// Re-export the main handler functions
pub use auth::{google_sign_in, sign_out};
pub use callback::google_callback;
pub use protected::secret;
pub use static_files::{failure, health, index};

/// Register every route of the application
///
/// Expects `SessionManager`, `GatekeepSettings` and
/// `dyn OAuthAuthenticationService` to be registered as `web::Data`.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // OAuth2 endpoints
        .route("/auth/google", web::get().to(google_sign_in))
        .route("/auth/google/callback", web::get().to(google_callback))
        .route("/auth/logout", web::get().to(sign_out))
        .route("/failure", web::get().to(failure))
        // Protected resources
        .route("/secret", web::get().to(secret))
        // Entry page and health
        .route("/", web::get().to(index))
        .route("/ping", web::get().to(health));
}
