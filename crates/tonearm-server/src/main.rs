//! Tonearm - a self-hosted audio shelf and browser playlist player.
//!
//! Serves the song library over a REST API and hosts the web player client.

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tonearm_server::config::{self, LogFormat};
use tonearm_server::library::Library;
use tonearm_server::models::AppState;
use tonearm_server::api;

/// Initialize the tracing/logging subsystem.
fn init_tracing(config: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Configure CORS based on application config.
fn configure_cors(config: &config::Config) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);

    if config.cors_origins.len() == 1 && config.cors_origins[0] == "*" {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Graceful shutdown handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize configuration
    let config = config::init();

    // Initialize logging
    init_tracing(config);

    // Validate configuration (creates the library directory on first start)
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    // Open the library
    let library = Library::open(&config.music_folder).map_err(|e| {
        tracing::error!(error = %e, "Failed to open library");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let app_state = AppState { library };

    let bind_address = config.bind_address();

    tracing::info!(
        address = %bind_address,
        music_folder = %config.music_folder.display(),
        "Starting Tonearm server"
    );

    // Create and start server
    let server = HttpServer::new(move || {
        let mut app = App::new()
            // Middleware (order matters - outermost first)
            .wrap(Logger::default())
            .wrap(configure_cors(config))
            // Shared state
            .app_data(web::Data::new(app_state.clone()))
            // Health endpoints
            .configure(api::health::configure)
            // Song endpoints
            .configure(api::songs::configure);

        // Web client, when a built dist directory is available
        if config.web_dist.is_dir() {
            app = app.service(
                actix_files::Files::new("/", &config.web_dist).index_file("index.html"),
            );
        }

        app
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run();

    // Run server with graceful shutdown
    tokio::select! {
        result = server => {
            result
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
    }
}
