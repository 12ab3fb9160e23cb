use crate::models::HealthResponse;
use crate::settings::GatekeepSettings;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpResponse};
use log::debug;
use std::fs;
use std::path::Path;

pub const FAILURE_MESSAGE: &str = "Failed to log in";

/// Health check endpoint
pub async fn health() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Gatekeep login server is running".to_string(),
    };
    HttpResponse::Ok().json(response)
}

/// Serve the entry page from the configured static directory
pub async fn index(settings: web::Data<GatekeepSettings>) -> HttpResponse {
    let file_path = Path::new(&settings.static_files.assets_folder).join("index.html");

    fs::read(&file_path).map_or_else(
        |_| {
            debug!("Entry page not found: {}", file_path.display());
            ResponseBuilder::not_found("File not found")
        },
        |contents| {
            HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(contents)
        },
    )
}

/// Landing page for a failed sign-in
pub async fn failure() -> HttpResponse {
    ResponseBuilder::text(FAILURE_MESSAGE)
}
