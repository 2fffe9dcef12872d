//! Notification events and the message they render to.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitor::RoomSnapshot;

/// A room went live and its groups should be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub room_id: String,
    pub display_name: String,
    pub room_url: String,
    pub cover_url: String,
    /// Groups to notify, in configuration order.
    pub group_ids: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn from_snapshot(snapshot: &RoomSnapshot, group_ids: &[String]) -> Self {
        Self {
            room_id: snapshot.room_id.clone(),
            display_name: snapshot.display_name.clone(),
            room_url: snapshot.room_url.clone(),
            cover_url: snapshot.cover_url.clone(),
            group_ids: group_ids.to_vec(),
            detected_at: Utc::now(),
        }
    }

    /// Text shown under the cover image.
    pub fn caption(&self) -> String {
        format!("{} is live!\n{}", self.display_name, self.room_url)
    }

    /// Cover image followed by the caption.
    pub fn message(&self) -> Vec<MessageSegment> {
        vec![
            MessageSegment::image(&self.cover_url),
            MessageSegment::text(self.caption()),
        ]
    }
}

/// One part of an outgoing bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum MessageSegment {
    Image { file: String },
    Text { text: String },
}

impl MessageSegment {
    pub fn image(file: impl Into<String>) -> Self {
        Self::Image { file: file.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}
