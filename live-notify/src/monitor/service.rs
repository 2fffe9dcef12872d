//! Live monitor service implementation.
//!
//! The LiveMonitor owns the room state and drives the poll loop:
//! one immediate check at startup, then fetch, detect, notify and sleep
//! until the process is told to stop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::detector::TransitionDetector;
use super::source::StatusSource;
use super::state::RoomStateStore;
use crate::config::{AppConfig, DEFAULT_POLL_INTERVAL_SECS, RoomConfig};
use crate::notification::NotificationService;

/// Configuration for the live monitor.
#[derive(Debug, Clone)]
pub struct LiveMonitorConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
}

impl Default for LiveMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl From<&AppConfig> for LiveMonitorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Configured rooms present in the poll result.
    pub rooms_checked: usize,
    /// Configured rooms missing from the poll result.
    pub rooms_missing: usize,
    /// Rooms that went live this cycle.
    pub events: usize,
    pub sends_ok: usize,
    pub sends_failed: usize,
    /// Set when the status fetch failed and the cycle was skipped.
    pub upstream_error: Option<String>,
}

impl CycleReport {
    pub fn is_skipped(&self) -> bool {
        self.upstream_error.is_some()
    }
}

/// The poll loop.
pub struct LiveMonitor {
    rooms: Vec<RoomConfig>,
    room_ids: Vec<String>,
    source: Arc<dyn StatusSource>,
    notifier: NotificationService,
    store: RoomStateStore,
    config: LiveMonitorConfig,
    cycles: u64,
}

impl LiveMonitor {
    pub fn new(
        rooms: Vec<RoomConfig>,
        source: Arc<dyn StatusSource>,
        notifier: NotificationService,
    ) -> Self {
        Self::with_config(rooms, source, notifier, LiveMonitorConfig::default())
    }

    pub fn with_config(
        rooms: Vec<RoomConfig>,
        source: Arc<dyn StatusSource>,
        notifier: NotificationService,
        config: LiveMonitorConfig,
    ) -> Self {
        let room_ids: Vec<String> = rooms.iter().map(|r| r.room_id.clone()).collect();
        let store = RoomStateStore::new(room_ids.iter().cloned());
        Self {
            rooms,
            room_ids,
            source,
            notifier,
            store,
            config,
            cycles: 0,
        }
    }

    /// Read-only view of the room state.
    pub fn store(&self) -> &RoomStateStore {
        &self.store
    }

    /// Number of cycles run so far, including skipped ones.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one fetch, detect and notify cycle.
    ///
    /// A failed fetch leaves the state untouched and is reported in the
    /// returned [`CycleReport`]; it never aborts the loop.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport::default();

        let fresh = match self.source.fetch_batch(&self.room_ids).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(cycle = self.cycles, error = %e, "Live status fetch failed, skipping cycle");
                report.upstream_error = Some(e.to_string());
                return report;
            }
        };

        let detection = TransitionDetector::detect(&fresh, &self.rooms, &mut self.store);
        report.rooms_checked = detection.checked;
        report.rooms_missing = detection.missing.len();
        report.events = detection.events.len();

        if !detection.missing.is_empty() {
            warn!(
                cycle = self.cycles,
                rooms = ?detection.missing,
                "Rooms missing from status reply, keeping previous state"
            );
        }

        if !detection.events.is_empty() {
            let dispatch = self.notifier.notify_all(&detection.events).await;
            report.sends_ok = dispatch.sent_count();
            report.sends_failed = dispatch.failure_count();
        }

        debug!(
            cycle = self.cycles,
            checked = report.rooms_checked,
            missing = report.rooms_missing,
            events = report.events,
            sent = report.sends_ok,
            failed = report.sends_failed,
            live = self.store.live_count(),
            "Poll cycle complete"
        );

        report
    }

    /// Run the initial check, then poll forever until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            rooms = self.rooms.len(),
            interval = ?self.config.poll_interval,
            "Starting live monitor"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(cycles = self.cycles, "Live monitor stopped");
    }
}
