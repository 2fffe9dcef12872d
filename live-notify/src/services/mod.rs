//! Service layer module.
//!
//! This module wires the application services together and manages
//! their lifecycle.

pub mod container;

pub use container::ServiceContainer;
