//! One connected client: signaling state machine plus its media transport.
//!
//! A session is created per connection and lives until the socket closes or
//! the client sends `disconnect`. All room membership flows through the
//! registry so teardown stays consistent when the socket drops without a
//! goodbye.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{ParticipantId, TransportError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{Member, Room};
use crate::server::AppState;
use crate::transport::MediaTransport;

/// What the connection loop should do after a message was handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Close,
}

pub struct Session {
    pub id: ParticipantId,
    name: Mutex<String>,
    room: Mutex<Option<Arc<Room>>>,
    signal: flume::Sender<ServerMessage>,
    transport: Arc<dyn MediaTransport>,
}

impl Session {
    pub fn new(signal: flume::Sender<ServerMessage>, transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            id: ParticipantId::generate(),
            name: Mutex::new(String::new()),
            room: Mutex::new(None),
            signal,
            transport,
        }
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn room(&self) -> Option<Arc<Room>> {
        self.room.lock().clone()
    }

    /// Handle one decoded inbound message. Transport faults bubble up and
    /// terminate the connection; everything else is reported in-band.
    pub fn handle_message(
        &self,
        state: &AppState,
        msg: ClientMessage,
    ) -> Result<Dispatch, TransportError> {
        match msg {
            ClientMessage::Join { name, room } => {
                self.join(state, name, room);
                Ok(Dispatch::Continue)
            }
            ClientMessage::Offer { sdp } => {
                let answer = self.transport.accept_offer(&sdp)?;
                self.send(ServerMessage::Answer { sdp: answer.sdp });
                for candidate in answer.candidates {
                    self.send(ServerMessage::Candidate { candidate });
                }
                // Renegotiation mid-call replaces the inbound track handle.
                if let Some(room) = self.room() {
                    room.add_track(self.id, self.transport.source());
                }
                Ok(Dispatch::Continue)
            }
            ClientMessage::Candidate { candidate } => {
                self.transport.add_remote_candidate(&candidate)?;
                Ok(Dispatch::Continue)
            }
            ClientMessage::Disconnect => {
                self.leave(state);
                Ok(Dispatch::Close)
            }
        }
    }

    fn join(&self, state: &AppState, name: String, room: String) {
        // Re-joining moves the participant; membership in two rooms at once
        // would double their audio.
        self.leave(state);
        *self.name.lock() = name.clone();

        let member = Member {
            name,
            signal: self.signal.clone(),
            sink: self.transport.sink(),
        };
        match state.registry.join(&room.as_str().into(), self.id, member) {
            Ok(room) => {
                room.add_track(self.id, self.transport.source());
                room.broadcast_participants();
                *self.room.lock() = Some(room);
            }
            Err(err) => {
                tracing::error!(%err, %room, "join failed");
                self.send(ServerMessage::Error {
                    message: format!("could not join room: {err}"),
                });
            }
        }
    }

    /// Leave the current room, if any. Called on `disconnect` and whenever
    /// the socket goes away, so it must be idempotent.
    pub fn leave(&self, state: &AppState) {
        if let Some(room) = self.room.lock().take() {
            state.registry.leave(&room, &self.id);
        }
    }

    fn send(&self, msg: ServerMessage) {
        let _ = self.signal.send(msg);
    }
}
