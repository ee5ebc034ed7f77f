//! Health check endpoints.

use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::models::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Service name.
    pub service: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// Service status.
    pub status: String,
    /// Library directory accessible.
    pub music_folder: bool,
}

/// Health check endpoint.
///
/// GET /health
///
/// Returns 200 if the service is running.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

/// Readiness check endpoint.
///
/// GET /ready
///
/// Returns 200 if the service is ready to accept requests.
#[get("/ready")]
pub async fn ready(data: web::Data<AppState>) -> HttpResponse {
    let music_folder_ok = data.library.root().is_dir();

    let response = ReadyResponse {
        status: if music_folder_ok { "ready" } else { "not_ready" }.to_string(),
        music_folder: music_folder_ok,
    };

    if music_folder_ok {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Configure health routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
