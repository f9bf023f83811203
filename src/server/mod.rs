pub mod handlers;
pub mod session;
pub mod types;

use crate::{
    Error, Result,
    config::{Config, CorsConfig, ServerConfig},
    gaze::{GazeProcessor, PupilTracker},
};
use axum::{Router, http::HeaderValue, routing::get};
use std::net::SocketAddr;
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn run(config: Config) -> Result<()> {
    // One estimator for the whole process, shared by every connection
    let estimator = PupilTracker::new(config.estimator.clone())?;
    let processor = GazeProcessor::new(Box::new(estimator));
    info!("Gaze estimator ready: {}", processor.estimator_name());

    let app = app(&config.server, processor)?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

pub fn app(config: &ServerConfig, processor: GazeProcessor) -> Result<Router> {
    let state = handlers::AppState {
        processor,
        max_message_bytes: config.max_message_bytes,
    };

    Ok(Router::new()
        .route("/", get(handlers::root))
        .route(types::HEALTH_PATH, get(handlers::health))
        .route(types::WEBSOCKET_PATH, get(handlers::gaze_socket))
        .with_state(state)
        .layer(cors_layer(&config.cors)?)
        .layer(TraceLayer::new_for_http()))
}

/// Browser access is limited to the configured origins. Methods and headers
/// are mirrored because a wildcard cannot be combined with credentials.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(String::as_str)
        .map(parse_origin)
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

fn parse_origin(origin: &str) -> Result<HeaderValue> {
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        return Err(Error::config(format!(
            "CORS origin '{}' must start with http:// or https://",
            origin
        )));
    }
    origin
        .parse::<HeaderValue>()
        .map_err(|e| Error::config(format!("invalid CORS origin '{}': {}", origin, e)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
