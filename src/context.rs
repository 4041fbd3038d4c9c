use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::DashboardConfig;
use crate::notify::{Notifier, ToastQueue};
use crate::observability::ApiMetrics;
use crate::orchestrator::{OrchestratorClient, ProcessService};
use crate::query::{QueryClient, RetryPolicy};

/// Everything a data-access call needs, created once at startup
pub struct DashboardContext {
    pub service: Arc<dyn ProcessService>,
    pub queries: QueryClient,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: Arc<ApiMetrics>,
    /// Folder used for listing and starting processes
    pub folder_id: i64,
    pub list_refetch_interval: Duration,
}

impl DashboardContext {
    pub fn new(
        service: Arc<dyn ProcessService>,
        notifier: Arc<dyn Notifier>,
        config: &DashboardConfig,
        metrics: Arc<ApiMetrics>,
    ) -> Self {
        let queries = QueryClient::new(
            config.query.cache_capacity,
            RetryPolicy::from_config(&config.query),
            metrics.clone(),
        );
        Self {
            service,
            queries,
            notifier,
            metrics,
            folder_id: config.orchestrator.folder_id,
            list_refetch_interval: config.query.list_refetch_interval(),
        }
    }

    /// Build the real Orchestrator client; notifications go to `toasts`
    pub fn from_config(config: &DashboardConfig, toasts: Arc<ToastQueue>) -> Result<Self> {
        config.validate()?;
        let metrics = Arc::new(ApiMetrics::new());
        let client = OrchestratorClient::new(&config.orchestrator, metrics.clone())?;
        info!(api_root = client.api_root(), folder_id = config.orchestrator.folder_id, "Orchestrator client ready");
        Ok(Self::new(Arc::new(client), toasts, config, metrics))
    }
}
