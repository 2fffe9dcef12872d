//! Notification service implementation.
//!
//! The NotificationService is responsible for:
//! - Sending each event to every destination group, one request per group
//! - Pacing consecutive sends with a fixed delay
//! - Isolating failures per (room, group) pair
//! - Optional bounded retries with exponential backoff

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::channels::NotificationChannel;
use super::events::{MessageSegment, NotificationEvent};
use crate::Error;
use crate::config::{AppConfig, DEFAULT_RETRY_DELAY_MS, DEFAULT_SEND_INTERVAL_MS};

/// Upper bound for a single retry delay.
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationServiceConfig {
    /// Delay between two consecutive sends in milliseconds.
    pub send_interval_ms: u64,
    /// Extra attempts per group after a failed send.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: DEFAULT_SEND_INTERVAL_MS,
            max_retries: 0,
            initial_retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl From<&AppConfig> for NotificationServiceConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            send_interval_ms: config.send_interval_ms,
            max_retries: config.max_send_retries,
            initial_retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// A send that failed after all attempts.
#[derive(Debug)]
pub struct DispatchFailure {
    pub room_id: String,
    pub group_id: String,
    pub error: Error,
}

/// Result of dispatching one or more events.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// `(room_id, group_id)` pairs that were delivered.
    pub delivered: Vec<(String, String)>,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn sent_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fans events out to their destination groups through one channel.
pub struct NotificationService {
    channel: Arc<dyn NotificationChannel>,
    config: NotificationServiceConfig,
}

impl NotificationService {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self::with_config(channel, NotificationServiceConfig::default())
    }

    pub fn with_config(channel: Arc<dyn NotificationChannel>, config: NotificationServiceConfig) -> Self {
        Self { channel, config }
    }

    /// Send one event to each of its groups.
    pub async fn notify(&self, event: &NotificationEvent) -> DispatchReport {
        self.notify_all(std::slice::from_ref(event)).await
    }

    /// Send every event to each of its groups, sequentially.
    ///
    /// The send interval is awaited between any two consecutive sends,
    /// including across events. A failure never stops the remaining sends.
    pub async fn notify_all(&self, events: &[NotificationEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut first = true;

        for event in events {
            let message = event.message();

            for group_id in &event.group_ids {
                if !first {
                    self.pace().await;
                }
                first = false;

                match self.send_with_retry(group_id, &message).await {
                    Ok(()) => {
                        info!(
                            room_id = %event.room_id,
                            group_id = %group_id,
                            "Sent live notification for {}",
                            event.display_name
                        );
                        report
                            .delivered
                            .push((event.room_id.clone(), group_id.clone()));
                    }
                    Err(error) => {
                        warn!(
                            room_id = %event.room_id,
                            group_id = %group_id,
                            error = %error,
                            "Failed to send live notification"
                        );
                        report.failures.push(DispatchFailure {
                            room_id: event.room_id.clone(),
                            group_id: group_id.clone(),
                            error,
                        });
                    }
                }
            }
        }

        report
    }

    async fn pace(&self) {
        if self.config.send_interval_ms > 0 {
            sleep(Duration::from_millis(self.config.send_interval_ms)).await;
        }
    }

    async fn send_with_retry(
        &self,
        group_id: &str,
        message: &[MessageSegment],
    ) -> crate::Result<()> {
        let mut attempts = 0;

        loop {
            match self.channel.send(group_id, message).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        return Err(e);
                    }

                    let delay = self.calculate_retry_delay(attempts);
                    debug!(
                        "Send to group {} via {} failed, retrying in {:?} (attempt {}/{}): {}",
                        group_id,
                        self.channel.channel_type(),
                        delay,
                        attempts + 1,
                        self.config.max_retries,
                        e
                    );
                    sleep(delay).await;
                    attempts += 1;
                }
            }
        }
    }

    /// Calculate retry delay with exponential backoff and jitter.
    fn calculate_retry_delay(&self, attempts: u32) -> Duration {
        let base_delay = self.config.initial_retry_delay_ms;

        // Exponential backoff: delay = base * 2^attempts
        let delay_ms = base_delay.saturating_mul(2u64.saturating_pow(attempts));
        let delay_ms = delay_ms.min(MAX_RETRY_DELAY_MS);

        // Add jitter (±25%)
        let jitter_range = delay_ms / 4;
        let jitter: i64 = if jitter_range > 0 {
            let random_val = rand::random::<u64>() % (jitter_range.saturating_mul(2).max(1));
            random_val as i64 - jitter_range as i64
        } else {
            0
        };

        Duration::from_millis(delay_ms.saturating_add_signed(jitter))
    }
}
