use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "process-dashboard.toml";

/// Main configuration structure for the process dashboard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// Orchestrator connection settings
    pub orchestrator: OrchestratorConfig,
    /// Query cache and polling settings
    pub query: QueryConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Cloud or on-prem base URL
    pub base_url: String,
    /// Organization name (first path segment)
    pub org_name: String,
    /// Tenant name (second path segment)
    pub tenant_name: String,
    /// Bearer secret (can be set via env var)
    pub secret: Option<String>,
    /// Folder the dashboard lists and starts processes in
    pub folder_id: i64,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Process list refetch interval while the dashboard is open
    pub list_refetch_interval_seconds: u64,
    /// Retries after the first failed attempt of a query
    pub retry: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Maximum number of cached query entries
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Emit JSON lines instead of the compact format
    pub json_logs: bool,
    /// Log API usage statistics on shutdown
    pub metrics_enabled: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                base_url: "https://cloud.uipath.com".to_string(),
                org_name: String::new(),
                tenant_name: String::new(),
                secret: None, // Read from env var or config file
                folder_id: 0,
                request_timeout_seconds: 30,
                rate_limit: RateLimitConfig {
                    requests_per_second: 5,
                    burst_capacity: 10,
                },
            },
            query: QueryConfig::default(),
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
                metrics_enabled: true,
            },
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            list_refetch_interval_seconds: 30,
            retry: 1,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
            cache_capacity: 256,
        }
    }
}

impl QueryConfig {
    pub fn list_refetch_interval(&self) -> Duration {
        Duration::from_secs(self.list_refetch_interval_seconds)
    }
}

impl DashboardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`path`, or process-dashboard.toml when present)
    /// 3. Environment variables (PROCESS_DASHBOARD_ORCHESTRATOR__FOLDER_ID, ...)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Configuration file not found: {}", path.display()));
                }
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("PROCESS_DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut dashboard_config: DashboardConfig = builder.build()?.try_deserialize()?;

        if dashboard_config.orchestrator.secret.is_none() {
            if let Ok(secret) = std::env::var("ORCHESTRATOR_SECRET") {
                dashboard_config.orchestrator.secret = Some(secret);
            }
        }

        Ok(dashboard_config)
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let orchestrator = &self.orchestrator;

        match orchestrator.secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => {
                return Err(anyhow!(
                    "Orchestrator secret is not set (orchestrator.secret or ORCHESTRATOR_SECRET)"
                ))
            }
        }
        if orchestrator.org_name.trim().is_empty() {
            return Err(anyhow!("orchestrator.org_name must not be empty"));
        }
        if orchestrator.tenant_name.trim().is_empty() {
            return Err(anyhow!("orchestrator.tenant_name must not be empty"));
        }
        if orchestrator.folder_id <= 0 {
            return Err(anyhow!(
                "orchestrator.folder_id must be a positive folder id, got {}",
                orchestrator.folder_id
            ));
        }
        reqwest::Url::parse(&orchestrator.base_url)
            .map_err(|e| anyhow!("orchestrator.base_url is not a valid URL: {e}"))?;
        if orchestrator.rate_limit.requests_per_second == 0
            || orchestrator.rate_limit.burst_capacity == 0
        {
            return Err(anyhow!("rate_limit quotas must be greater than zero"));
        }
        if self.query.list_refetch_interval_seconds == 0 {
            return Err(anyhow!("query.list_refetch_interval_seconds must be greater than zero"));
        }

        Ok(())
    }

    /// Copy with the secret masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.orchestrator.secret.is_some() {
            copy.orchestrator.secret = Some("********".to_string());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
