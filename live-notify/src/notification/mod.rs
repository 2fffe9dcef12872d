//! Notification system module.
//!
//! Renders go-live events into bot messages and delivers them to every
//! destination group of the room through a [`NotificationChannel`].
//!
//! # Example
//!
//! ```ignore
//! use live_notify::notification::{NotificationService, OneBotChannel, OneBotConfig};
//!
//! let channel = OneBotChannel::new(
//!     OneBotConfig {
//!         base_url: "http://127.0.0.1:3000".to_string(),
//!         token: "secret".to_string(),
//!     },
//!     reqwest::Client::new(),
//! );
//! let service = NotificationService::new(std::sync::Arc::new(channel));
//! let report = service.notify(&event).await;
//! ```

pub mod channels;
pub mod events;
pub mod service;

pub use channels::{NotificationChannel, OneBotChannel, OneBotConfig};
pub use events::{MessageSegment, NotificationEvent};
pub use service::{DispatchFailure, DispatchReport, NotificationService, NotificationServiceConfig};
