#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the gatekeep application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod tls;
pub mod utils;

#[cfg(feature = "testing")]
pub mod testing;

/// Re-export commonly used items
pub use app::{security_headers, AppServices};
pub use guard::{AuthRequired, Authenticated};
pub use handlers::configure_services;
pub use models::{SessionPrincipal, UserProfile};
pub use oauth::{OAuthAuthenticationService, OAuthConfig, OAuthError};
pub use session::SessionManager;
pub use settings::GatekeepSettings;
