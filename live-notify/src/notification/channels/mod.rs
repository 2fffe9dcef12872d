//! Notification channels.
//!
//! A channel delivers one message to one destination group. Fan-out,
//! pacing and retries live in [`super::NotificationService`].

mod onebot;

pub use onebot::{OneBotChannel, OneBotConfig};

use async_trait::async_trait;

use super::events::MessageSegment;
use crate::Result;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Send `message` to `group_id`.
    ///
    /// Failures are reported as [`crate::Error::Dispatch`].
    async fn send(&self, group_id: &str, message: &[MessageSegment]) -> Result<()>;
}
