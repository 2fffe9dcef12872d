//! Startup configuration.
//!
//! The configuration is read once from a JSON file before the monitor
//! starts. It is immutable afterwards; there is no runtime reload.

mod loader;

pub use loader::{
    AppConfig, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_SEND_INTERVAL_MS, DEFAULT_STATUS_API_URL, DEFAULT_USER_AGENT, RoomConfig,
};
