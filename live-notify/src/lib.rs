//! live-notify library crate.
//!
//! Polls Bilibili live rooms on a fixed interval and announces each
//! offline-to-live transition to the configured groups through a
//! OneBot-style bot HTTP API.

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
