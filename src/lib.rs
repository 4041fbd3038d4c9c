// Process Dashboard Library - Orchestrator process listing and triggering
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod context;
pub mod notify;
pub mod observability;
pub mod orchestrator;
pub mod query;
pub mod shutdown;
pub mod telemetry;
pub mod ui;

// Re-export key types for easy access
pub use config::DashboardConfig;
pub use context::DashboardContext;
pub use notify::{Notification, NotificationLevel, Notifier, ToastQueue};
pub use observability::{ApiMetrics, ApiStats, OperationTimer};
pub use orchestrator::{JobStatus, OrchestratorClient, OrchestratorError, Process, ProcessService, StartResult};
pub use query::{
    ProcessListPoller, ProcessListQuery, ProcessQuery, QueryClient, QueryKey, QueryResult, RetryPolicy,
    StartProcessInput, StartProcessMutation,
};
pub use shutdown::ShutdownCoordinator;
pub use telemetry::{create_session_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use ui::{HomePage, JobStatusBadge, ProcessCard};
