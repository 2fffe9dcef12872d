use std::collections::HashMap;

use serde::Deserialize;

/// Response of the `getRoomBaseInfo` batch endpoint.
#[derive(Debug, Deserialize)]
pub struct RoomBaseInfoResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<RoomBaseInfoData>,
}

#[derive(Debug, Deserialize)]
pub struct RoomBaseInfoData {
    #[serde(default)]
    pub by_room_ids: Option<HashMap<String, RoomBaseInfo>>,
}

#[derive(Debug, Deserialize)]
pub struct RoomBaseInfo {
    /// Real (long) room id.
    #[serde(default)]
    pub room_id: u64,
    /// Short vanity id, 0 when the room has none.
    #[serde(default)]
    pub short_id: u64,
    pub live_status: i64,
    #[serde(default)]
    pub cover: Option<String>,
    pub uname: String,
    pub live_url: String,
}

impl RoomBaseInfo {
    /// Whether `requested` names this room, by map key, real id or short id.
    pub fn answers(&self, key: &str, requested: &str) -> bool {
        requested == key
            || (self.room_id != 0 && requested == self.room_id.to_string())
            || (self.short_id != 0 && requested == self.short_id.to_string())
    }
}
