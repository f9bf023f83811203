use super::{
    session,
    types::{Endpoints, HEALTH_PATH, HealthResponse, SERVICE_NAME, ServiceInfo, WEBSOCKET_PATH},
};
use crate::gaze::GazeProcessor;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::{IntoResponse, Json},
};
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub processor: GazeProcessor,
    pub max_message_bytes: usize,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        gaze_tracking_available: true,
    })
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "GazeTracking Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: Endpoints {
            websocket: WEBSOCKET_PATH.to_string(),
            health: HEALTH_PATH.to_string(),
        },
    })
}

pub async fn gaze_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    debug!("Upgrading connection to WebSocket");
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| session::run(socket, state.processor))
}
