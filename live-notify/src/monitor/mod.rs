//! Live monitor module.
//!
//! The monitor is responsible for:
//! - Querying the live status of every watched room in one batch request
//! - Tracking the last known status of each room
//! - Detecting offline-to-live transitions
//! - Driving the fixed-interval poll loop and handing events to the
//!   notification service

mod detector;
mod models;
mod service;
mod source;
mod state;

pub use detector::{Detection, TransitionDetector};
pub use service::{CycleReport, LiveMonitor, LiveMonitorConfig};
pub use source::{BilibiliStatusSource, LiveStatus, RoomSnapshot, StatusSource};
pub use state::{RoomState, RoomStateStore};
