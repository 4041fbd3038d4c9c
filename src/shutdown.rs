use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::observability::ApiMetrics;

/// Graceful shutdown coordinator for the dashboard
///
/// Long-running tasks hold a receiver from [`ShutdownCoordinator::subscribe`]
/// and stop once it flips to `true`.
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    pub fn trigger(&self) {
        // send_replace succeeds with no receivers
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Trigger shutdown on Ctrl-C
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    coordinator.trigger();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });
    }

    /// Final bookkeeping once every task has stopped
    pub fn finish(&self, metrics: &ApiMetrics, metrics_enabled: bool) {
        self.trigger();
        if metrics_enabled {
            metrics.log_stats();
        }
        info!("Graceful shutdown completed successfully");
    }
}
