//! Last-known status per room.

use std::collections::HashMap;

use super::source::{LiveStatus, RoomSnapshot};

/// Last observed status and metadata of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomState {
    pub status: LiveStatus,
    pub cover_url: String,
    pub display_name: String,
    pub room_url: String,
}

impl RoomState {
    /// Offline with all cached metadata cleared.
    pub fn offline() -> Self {
        Self {
            status: LiveStatus::Offline,
            ..Default::default()
        }
    }

    /// Live, carrying the metadata of `snapshot`.
    pub fn live_from(snapshot: &RoomSnapshot) -> Self {
        Self {
            status: LiveStatus::Live,
            cover_url: snapshot.cover_url.clone(),
            display_name: snapshot.display_name.clone(),
            room_url: snapshot.room_url.clone(),
        }
    }
}

/// Per-room state, owned by the poll loop.
///
/// Holds exactly one entry per configured room. Mutation requires
/// `&mut self`, so the owner serializes all writes.
#[derive(Debug, Default)]
pub struct RoomStateStore {
    rooms: HashMap<String, RoomState>,
}

impl RoomStateStore {
    /// Seed an `Unknown` entry for every configured room.
    pub fn new<I, S>(room_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rooms: room_ids
                .into_iter()
                .map(|id| (id.into(), RoomState::default()))
                .collect(),
        }
    }

    pub fn get(&self, room_id: &str) -> Option<&RoomState> {
        self.rooms.get(room_id)
    }

    /// Stored status, `Unknown` when the room has not been observed.
    pub fn status(&self, room_id: &str) -> LiveStatus {
        self.rooms
            .get(room_id)
            .map(|state| state.status)
            .unwrap_or_default()
    }

    /// Replace the state of a configured room. Returns `false` and stores
    /// nothing when `room_id` is not tracked.
    pub fn set(&mut self, room_id: &str, state: RoomState) -> bool {
        match self.rooms.get_mut(room_id) {
            Some(entry) => {
                *entry = state;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.rooms.values().filter(|s| s.status.is_live()).count()
    }
}
