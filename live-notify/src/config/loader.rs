use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Error, Result};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_STATUS_API_URL: &str =
    "https://api.live.bilibili.com/xlive/web-room/v1/index/getRoomBaseInfo";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Root configuration, deserialized from `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the bot HTTP API (`/send_msg` is appended).
    pub http_base_url: String,
    /// Bearer token for the bot HTTP API.
    pub token: String,
    /// Rooms to watch.
    pub live_rooms: Vec<RoomConfig>,
    /// Seconds to sleep between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Delay between two consecutive notification sends, in milliseconds.
    #[serde(default = "default_send_interval")]
    pub send_interval_ms: u64,
    /// Per-request timeout for both the status query and notification sends.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Extra attempts per (room, group) after a failed send. 0 disables retries.
    #[serde(default)]
    pub max_send_retries: u32,
    /// Base delay for send retries, doubled on every attempt.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Live-status batch endpoint.
    #[serde(default = "default_status_api_url")]
    pub status_api_url: String,
    /// User agent sent to the status endpoint.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// A watched room and the groups notified when it goes live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomConfig {
    #[serde(deserialize_with = "deserialize_id")]
    pub room_id: String,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub group_ids: Vec<String>,
}

impl RoomConfig {
    pub fn new(room_id: impl Into<String>, group_ids: Vec<String>) -> Self {
        Self {
            room_id: room_id.into(),
            group_ids,
        }
    }
}

impl AppConfig {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&content).map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })?;
        debug!(
            path = %path.display(),
            rooms = config.live_rooms.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.http_base_url.trim().is_empty() {
            return Err(Error::config("http_base_url must not be empty"));
        }
        if self.token.trim().is_empty() {
            return Err(Error::config("token must not be empty"));
        }
        if self.live_rooms.is_empty() {
            return Err(Error::config("live_rooms must contain at least one room"));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll_interval_secs must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }

        let mut seen = HashSet::new();
        for room in &self.live_rooms {
            if room.room_id.trim().is_empty() {
                return Err(Error::config("room_id must not be empty"));
            }
            if !seen.insert(room.room_id.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate room_id in live_rooms: {}",
                    room.room_id
                )));
            }
            if room.group_ids.is_empty() {
                warn!(room_id = %room.room_id, "Room has no group_ids; it will be tracked but never notified");
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_send_interval() -> u64 {
    DEFAULT_SEND_INTERVAL_MS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_status_api_url() -> String {
    DEFAULT_STATUS_API_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Room and group ids are written either as JSON strings or as bare integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    Str(String),
    Int(i64),
}

impl From<StringOrInt> for String {
    fn from(value: StringOrInt) -> Self {
        match value {
            StringOrInt::Str(s) => s.trim().to_string(),
            StringOrInt::Int(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    StringOrInt::deserialize(deserializer).map(String::from)
}

fn deserialize_id_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ids = Vec::<StringOrInt>::deserialize(deserializer)?;
    Ok(ids.into_iter().map(String::from).collect())
}
