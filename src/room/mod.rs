//! Rooms: isolated mixing domains.
//!
//! A room owns its members and tracks behind one `RwLock` and drives a
//! [`mixer::MixEngine`] task on a fixed cadence. The registry creates the
//! room on first join and the room tears itself down the moment its member
//! count reaches zero — a `closed` flag flipped under the write lock keeps
//! teardown atomic with respect to concurrent joins, and a cancellation
//! token stops the mixer within one tick.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::common::{ParticipantId, RoomError, RoomId};
use crate::protocol::ServerMessage;

pub mod mixer;
pub mod registry;
pub mod track;

pub use mixer::{MixEngine, TickReport};
pub use registry::RoomRegistry;
pub use track::{AudioPacket, TrackSink, TrackSource};

/// One member: display name, signaling channel, outbound audio sink.
#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub signal: flume::Sender<ServerMessage>,
    pub sink: Arc<dyn TrackSink>,
}

struct RoomInner {
    members: HashMap<ParticipantId, Member>,
    tracks: HashMap<ParticipantId, Arc<dyn TrackSource>>,
    closed: bool,
}

pub struct Room {
    id: RoomId,
    inner: RwLock<RoomInner>,
    stop: CancellationToken,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Arc<Self> {
        Arc::new(Self {
            id,
            inner: RwLock::new(RoomInner {
                members: HashMap::new(),
                tracks: HashMap::new(),
                closed: false,
            }),
            stop: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    pub fn member_count(&self) -> usize {
        self.inner.read().members.len()
    }

    pub(crate) fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// Insert a member. Fails on a room that already tore itself down; the
    /// join path then retries against a freshly created room.
    pub fn add_member(&self, id: ParticipantId, member: Member) -> Result<(), RoomError> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(RoomError::Closed);
        }
        inner.members.insert(id, member);
        Ok(())
    }

    /// Remove a member and their track. Returns `true` when this removal
    /// emptied the room — the room is then closed and its mixer cancelled,
    /// and the caller must drop the registry entry.
    pub fn remove_member(&self, id: &ParticipantId) -> bool {
        let mut inner = self.inner.write();
        inner.members.remove(id);
        inner.tracks.remove(id);
        if inner.members.is_empty() && !inner.closed {
            inner.closed = true;
            self.stop.cancel();
            return true;
        }
        false
    }

    /// Register or replace the inbound track for a participant. Members may
    /// exist without a track; the mixer skips them. A no-op on a closed room.
    pub fn add_track(&self, id: ParticipantId, source: Arc<dyn TrackSource>) {
        let mut inner = self.inner.write();
        if inner.closed {
            return;
        }
        inner.tracks.insert(id, source);
    }

    pub fn participant_names(&self) -> Vec<String> {
        self.inner
            .read()
            .members
            .values()
            .map(|m| m.name.clone())
            .collect()
    }

    /// Push the current display-name list to every member's signaling
    /// channel. A dead channel is skipped; it never blocks the others.
    pub fn broadcast_participants(&self) {
        let (list, signals) = {
            let inner = self.inner.read();
            let list: Vec<String> = inner.members.values().map(|m| m.name.clone()).collect();
            let signals: Vec<flume::Sender<ServerMessage>> =
                inner.members.values().map(|m| m.signal.clone()).collect();
            (list, signals)
        };

        for signal in signals {
            if signal
                .send(ServerMessage::Participants { list: list.clone() })
                .is_err()
            {
                tracing::debug!(room = %self.id, "participant list dropped: signaling channel gone");
            }
        }
    }

    /// Point-in-time view of the contributing tracks. The lock is released
    /// before any codec work happens on the snapshot.
    pub(crate) fn snapshot_sources(&self) -> Vec<(ParticipantId, Arc<dyn TrackSource>)> {
        self.inner
            .read()
            .tracks
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect()
    }

    /// Point-in-time view of the member sinks, taken independently of the
    /// source snapshot.
    pub(crate) fn snapshot_sinks(&self) -> Vec<(ParticipantId, Arc<dyn TrackSink>)> {
        self.inner
            .read()
            .members
            .iter()
            .map(|(id, m)| (*id, m.sink.clone()))
            .collect()
    }
}
