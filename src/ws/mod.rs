use std::sync::Arc;

use axum::{
    extract::{State, ws::WebSocketUpgrade},
    response::IntoResponse,
};

use crate::server::AppState;

pub mod handler;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handler::handle_socket(socket, state))
}
