//! Service container.
//!
//! The ServiceContainer builds the shared HTTP client, the status source,
//! the notification channel and the live monitor from an [`AppConfig`],
//! and owns the lifecycle of the monitor task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::monitor::{BilibiliStatusSource, LiveMonitor};
use crate::notification::{NotificationService, OneBotChannel, OneBotConfig};
use crate::utils::http_client::build_client;
use crate::{Error, Result};

/// Default shutdown timeout.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Holds the wired monitor until it is started.
pub struct ServiceContainer {
    monitor: Option<LiveMonitor>,
    task: Option<JoinHandle<()>>,
    /// Cancellation token for graceful shutdown.
    cancellation_token: CancellationToken,
}

impl ServiceContainer {
    /// Wire every service from a validated configuration, stopping when
    /// `cancellation_token` fires.
    pub fn with_cancellation(
        config: &AppConfig,
        cancellation_token: CancellationToken,
    ) -> Result<Self> {
        info!(rooms = config.live_rooms.len(), "Initializing services");

        let client = build_client(config.request_timeout(), &config.user_agent)?;

        let source = BilibiliStatusSource::new(client.clone(), &config.status_api_url);
        let channel = OneBotChannel::new(
            OneBotConfig {
                base_url: config.http_base_url.clone(),
                token: config.token.clone(),
            },
            client,
        );
        let notifier = NotificationService::with_config(Arc::new(channel), config.into());
        let monitor = LiveMonitor::with_config(
            config.live_rooms.clone(),
            Arc::new(source),
            notifier,
            config.into(),
        );

        Ok(Self {
            monitor: Some(monitor),
            task: None,
            cancellation_token,
        })
    }

    /// Spawn the monitor loop. The first check runs immediately.
    pub fn start(&mut self) -> Result<()> {
        let monitor = self
            .monitor
            .take()
            .ok_or_else(|| Error::Other("Live monitor already started".to_string()))?;
        self.task = Some(tokio::spawn(monitor.run(self.cancellation_token.clone())));
        Ok(())
    }

    /// Shutdown all services gracefully.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown all services gracefully with a custom timeout.
    ///
    /// A cycle in flight is abandoned at its next await point; room state
    /// is not persisted.
    pub async fn shutdown_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);

        self.cancellation_token.cancel();

        if let Some(task) = self.task.take() {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Live monitor task ended abnormally"),
                Err(_) => warn!("Shutdown timeout reached, forcing shutdown"),
            }
        }

        info!("Services shut down");
        Ok(())
    }
}
