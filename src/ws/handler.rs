//! Per-connection socket loop: bridges the signaling channel and the wire.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use tracing::{error, info, warn};

use crate::common::ProtocolError;
use crate::protocol::{self, ServerMessage};
use crate::server::{AppState, Dispatch, Session};

pub async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (tx, rx) = flume::unbounded();

    let transport = match state.transports.create() {
        Ok(t) => t,
        Err(e) => {
            error!("Transport setup failed: {e}");
            return;
        }
    };
    let session = Session::new(tx, transport);
    info!("WebSocket connected: participant={}", session.id);

    // Main event loop
    loop {
        tokio::select! {
            Ok(msg) = rx.recv_async() => {
                if let Err(e) = send_message(&mut socket, &msg).await {
                    error!("Socket send error: participant={} err={}", session.id, e);
                    break;
                }
            }
            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("WebSocket error: participant={} err={}", session.id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => match protocol::parse_client_message(&text) {
                        Ok(decoded) => match session.handle_message(&state, decoded) {
                            Ok(Dispatch::Continue) => {}
                            Ok(Dispatch::Close) => break,
                            Err(e) => {
                                error!("Transport error: participant={} err={}", session.id, e);
                                break;
                            }
                        },
                        Err(err @ ProtocolError::Unrecognized(_)) => {
                            warn!("participant={} {}", session.id, err);
                            let reply = ServerMessage::Error {
                                message: err.to_string(),
                            };
                            if send_message(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                        Err(err @ ProtocolError::Malformed(_)) => {
                            warn!("participant={} {}", session.id, err);
                            break;
                        }
                    },
                    Message::Close(_) => break,
                    // Ping/Pong handled by axum; binary frames have no meaning here.
                    _ => {}
                }
            }
        }
    }

    session.leave(&state);
    info!("WebSocket disconnected: participant={}", session.id);
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
