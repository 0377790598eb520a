use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use triage_relay::config::{LoggingSettings, Settings};
use triage_relay::routes::{build_cors, configure_routes, AppState};
use triage_relay::services::{GeminiClient, ModelClient};

/// RUST_LOG, when set, takes precedence over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let logging = settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default();
    init_tracing(&logging);

    info!("Starting triage relay...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    // Select the first candidate model the API accepts
    let gemini = GeminiClient::connect(&settings.gemini).await.map_err(|e| {
        error!("Failed to load any model: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    match settings.gemini.request_timeout_secs {
        Some(secs) => info!("Model client ready ({}), timeout {}s", gemini.model_name(), secs),
        None => info!("Model client ready ({}), no request timeout", gemini.model_name()),
    }

    let app_state = AppState {
        model: Arc::new(gemini),
        max_audio_bytes: settings.server.max_audio_bytes,
    };

    if settings.cors.permissive {
        warn!("CORS allows any origin with credentials; use only for local development");
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let cors_settings = settings.cors.clone();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(build_cors(&cors_settings))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
