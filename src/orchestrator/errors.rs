use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    /// A required identifier was missing; raised before any request is sent.
    #[error("{0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Transport(String),
    #[error("Request to Orchestrator timed out: {0}")]
    Timeout(String),
    #[error("Process {process_id} not found in folder {folder_id}")]
    NotFound { process_id: i64, folder_id: i64 },
    #[error("Orchestrator returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid response from Orchestrator: {0}")]
    InvalidResponse(String),
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrchestratorError::Validation(message.into())
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Transport(_) | OrchestratorError::Timeout(_) => true,
            OrchestratorError::Api { status, .. } => *status >= 500 || *status == 429,
            OrchestratorError::Validation(_)
            | OrchestratorError::Config(_)
            | OrchestratorError::NotFound { .. }
            | OrchestratorError::InvalidResponse(_) => false,
        }
    }

    /// Short hints printed under the error by the CLI.
    pub fn troubleshooting(&self) -> Vec<&'static str> {
        match self {
            OrchestratorError::Validation(_) => vec!["Pass the missing identifier and retry"],
            OrchestratorError::Config(_) => vec![
                "Check process-dashboard.toml or PROCESS_DASHBOARD_* variables",
                "Set the secret with: export ORCHESTRATOR_SECRET=your_secret",
                "Print the effective settings: process-dashboard config",
            ],
            OrchestratorError::Transport(_) | OrchestratorError::Timeout(_) => vec![
                "Check network connectivity to the Orchestrator base URL",
                "Check proxy settings (HTTPS_PROXY)",
                "Raise orchestrator.request_timeout_seconds for slow tenants",
            ],
            OrchestratorError::NotFound { .. } => vec![
                "List available processes: process-dashboard list",
                "Confirm the folder id matches the process folder",
            ],
            OrchestratorError::Api { status, .. } => match status {
                401 => vec![
                    "Secret is invalid or expired",
                    "Generate a new token and update ORCHESTRATOR_SECRET",
                ],
                403 => vec![
                    "Token lacks permissions for this folder",
                    "Check the folder id and the token scopes",
                ],
                429 => vec!["Orchestrator is throttling requests; lower rate_limit settings"],
                _ => vec![
                    "Verify org and tenant names",
                    "Check the Orchestrator service status",
                ],
            },
            OrchestratorError::InvalidResponse(_) => vec![
                "The Orchestrator API version may be unsupported",
                "Run with RUST_LOG=debug to inspect the response",
            ],
        }
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OrchestratorError::Timeout(err.to_string())
        } else if err.is_decode() {
            OrchestratorError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            OrchestratorError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            OrchestratorError::Transport(err.to_string())
        }
    }
}
