//! Process-wide directory of active rooms.
//!
//! Explicitly owned state (held in the axum router's shared state, or a
//! fresh instance per test) — never a global. The `DashMap` entry API makes
//! create-on-first-join atomic per key: exactly one room instance and one
//! mixer task per identifier, no matter how many joins race.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::audio::codec::CodecFactory;
use crate::common::{CodecError, ParticipantId, RoomId};
use crate::room::mixer::MixEngine;
use crate::room::{Member, Room};

pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    codec: Arc<dyn CodecFactory>,
}

impl RoomRegistry {
    pub fn new(codec: Arc<dyn CodecFactory>) -> Self {
        Self {
            rooms: DashMap::new(),
            codec,
        }
    }

    /// Return the room for `id`, creating it and starting its mixer task if
    /// absent. An entry whose room already closed is replaced in place.
    pub fn get_or_create(&self, id: &RoomId) -> Result<Arc<Room>, CodecError> {
        match self.rooms.entry(id.clone()) {
            Entry::Occupied(mut e) => {
                // The directory shard lock is held here. A room's inner lock
                // is a separate scope that must never nest with it, so the
                // closed probe goes through the cancellation token, which
                // fires in the same critical section that sets `closed`.
                if e.get().stop_token().is_cancelled() {
                    let room = self.start_room(id)?;
                    e.insert(room.clone());
                    Ok(room)
                } else {
                    Ok(e.get().clone())
                }
            }
            Entry::Vacant(v) => {
                let room = self.start_room(id)?;
                v.insert(room.clone());
                Ok(room)
            }
        }
    }

    /// Add `member` to the room `id`, creating the room if needed. Retries
    /// when the target room closes between lookup and insert.
    pub fn join(
        &self,
        id: &RoomId,
        participant: ParticipantId,
        member: Member,
    ) -> Result<Arc<Room>, CodecError> {
        loop {
            let room = self.get_or_create(id)?;
            if room.add_member(participant, member.clone()).is_ok() {
                tracing::info!(room = %id, participant = %participant, "participant joined");
                return Ok(room);
            }
            // Lost the race against teardown; drop the stale entry and retry.
            self.rooms.remove_if(id, |_, r| Arc::ptr_eq(r, &room));
        }
    }

    /// Remove `participant` from `room`. When the removal empties the room,
    /// its directory entry is dropped (pointer-guarded, so a room recreated
    /// under the same id in the meantime is left alone); otherwise the
    /// remaining members get a fresh participant list.
    pub fn leave(&self, room: &Arc<Room>, participant: &ParticipantId) {
        if room.remove_member(participant) {
            self.rooms.remove_if(room.id(), |_, r| Arc::ptr_eq(r, room));
            tracing::info!(room = %room.id(), "room emptied and removed");
        } else {
            room.broadcast_participants();
        }
        tracing::info!(room = %room.id(), participant = %participant, "participant left");
    }

    /// Delete the directory entry for `id`. Idempotent: removing an absent
    /// id is a no-op.
    pub fn remove(&self, id: &RoomId) {
        self.rooms.remove(id);
    }

    pub fn get(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn start_room(&self, id: &RoomId) -> Result<Arc<Room>, CodecError> {
        // A room whose codec cannot initialize must never be installed.
        self.codec.new_decoder()?;
        self.codec.new_encoder()?;

        let room = Room::new(id.clone());
        tokio::spawn(MixEngine::new(self.codec.clone()).run(room.clone()));
        tracing::info!(room = %id, "room created, mixing started");
        Ok(room)
    }
}
