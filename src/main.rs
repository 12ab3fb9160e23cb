#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, App, HttpServer};
use gatekeep::{
    app::{security_headers, AppServices},
    settings::GatekeepSettings,
    tls::build_ssl_acceptor,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = GatekeepSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let services = AppServices::from_settings(settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize services: {e}")))?;

    start_server(services).await
}

/// Start the server, terminating TLS in-process when enabled
///
/// # Errors
///
/// Returns an error if:
/// - The TLS key or certificate cannot be loaded
/// - Server binding fails
async fn start_server(services: AppServices) -> std::io::Result<()> {
    let settings = services.settings().clone();
    let bind_address = settings.get_bind_address();
    let tls_enabled = settings.tls.enabled;
    print_startup_info(&bind_address, &settings);

    if tls_enabled && !settings.cookies.secure {
        log::warn!("TLS is enabled but COOKIE_SECURE is false; session cookies may travel over plain HTTP");
    }
    if !tls_enabled && settings.cookies.secure {
        log::warn!("TLS is disabled but COOKIE_SECURE is true; browsers will drop cookies on http://");
    }

    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(security_headers(tls_enabled))
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg))
    });

    if tls_enabled {
        let acceptor = build_ssl_acceptor(&settings.tls)?;
        server.bind_openssl(&bind_address, acceptor)?.run().await
    } else {
        server.bind(&bind_address)?.run().await
    }
}

fn print_startup_info(bind_address: &str, settings: &GatekeepSettings) {
    let scheme = if settings.tls.enabled { "https" } else { "http" };
    println!(
        "Starting Gatekeep {} on {scheme}://{bind_address}",
        gatekeep::VERSION
    );
    println!();
    println!("OAuth2 endpoints:");
    println!("  GET  /auth/google          - Start Google sign-in");
    println!("  GET  /auth/google/callback - OAuth callback");
    println!("  GET  /auth/logout          - Clear session");
    println!("  GET  /failure              - Failed sign-in page");
    println!();
    println!("OAuth callback URL for the identity provider:");
    println!("  {}", settings.callback_url());
    println!();
    println!("Protected endpoints:");
    println!("  GET  /secret               - Requires a session");
    println!();
    println!("System endpoints:");
    println!("  GET  /                     - Entry page");
    println!("  GET  /ping                 - Health check");
    println!(
        "  Static files folder: {}",
        settings.static_files.assets_folder
    );
}
