use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OrchestratorConfig;
use crate::observability::{ApiMetrics, OperationTimer};
use crate::orchestrator::errors::OrchestratorError;
use crate::orchestrator::types::{ListEnvelope, Process, StartJobsRequest, StartResult};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub const FOLDER_HEADER: &str = "X-UIPATH-OrganizationUnitId";

/// Process operations offered by Orchestrator
///
/// The dashboard only talks to this trait so tests can swap in a fake service.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ProcessService: Send + Sync {
    /// List processes, optionally scoped to a folder
    async fn list_processes(&self, folder_id: Option<i64>) -> Result<Vec<Process>, OrchestratorError>;

    /// Fetch a single process; fails with `NotFound` when it does not exist
    async fn get_process(&self, process_id: i64, folder_id: i64) -> Result<Process, OrchestratorError>;

    /// Start a process, returning one record per created job
    async fn start_process(
        &self,
        process_key: &str,
        folder_id: i64,
    ) -> Result<Vec<StartResult>, OrchestratorError>;
}

/// Rate-limited HTTP client for the Orchestrator OData API
#[derive(Debug)]
pub struct OrchestratorClient {
    http: Client,
    api_root: String,
    secret: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    metrics: Arc<ApiMetrics>,
}

impl OrchestratorClient {
    pub fn new(config: &OrchestratorConfig, metrics: Arc<ApiMetrics>) -> Result<Self, OrchestratorError> {
        let secret = config
            .secret
            .clone()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| OrchestratorError::Config("Orchestrator secret is not set".to_string()))?;

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second)
            .ok_or_else(|| OrchestratorError::Config("requests_per_second must be non-zero".to_string()))?;
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity)
            .ok_or_else(|| OrchestratorError::Config("burst_capacity must be non-zero".to_string()))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| OrchestratorError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_root = format!(
            "{}/{}/{}/orchestrator_",
            config.base_url.trim_end_matches('/'),
            config.org_name,
            config.tenant_name
        );

        Ok(Self {
            http,
            api_root,
            secret,
            rate_limiter,
            metrics,
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn with_folder(request: RequestBuilder, folder_id: Option<i64>) -> RequestBuilder {
        match folder_id {
            Some(folder_id) => request.header(FOLDER_HEADER, folder_id.to_string()),
            None => request,
        }
    }

    /// Send a request under the rate limiter and decode a JSON body
    async fn send<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T, OrchestratorError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let timer = OperationTimer::new(operation);
        self.metrics.record_request();
        debug!(operation, "Sending Orchestrator request");

        let result = self.execute(request).await;
        if let Err(e) = &result {
            self.metrics.record_error();
            warn!(operation, error = %e, "Orchestrator request failed");
        }
        timer.finish(result.is_ok());
        result
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, OrchestratorError> {
        let response = request
            .bearer_auth(&self.secret)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| OrchestratorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ProcessService for OrchestratorClient {
    async fn list_processes(&self, folder_id: Option<i64>) -> Result<Vec<Process>, OrchestratorError> {
        let request = Self::with_folder(self.http.get(self.endpoint("/odata/Releases")), folder_id);
        let envelope: ListEnvelope<Process> = self.send("list_processes", request).await?;
        Ok(envelope.into_items())
    }

    async fn get_process(&self, process_id: i64, folder_id: i64) -> Result<Process, OrchestratorError> {
        let url = self.endpoint(&format!("/odata/Releases({process_id})"));
        let request = Self::with_folder(self.http.get(url), Some(folder_id));
        match self.send("get_process", request).await {
            Err(OrchestratorError::Api { status: 404, .. }) => Err(OrchestratorError::NotFound {
                process_id,
                folder_id,
            }),
            other => other,
        }
    }

    async fn start_process(
        &self,
        process_key: &str,
        folder_id: i64,
    ) -> Result<Vec<StartResult>, OrchestratorError> {
        let url = self.endpoint("/odata/Jobs/UiPath.Server.Configuration.OData.StartJobs");
        let request = Self::with_folder(self.http.post(url), Some(folder_id))
            .json(&StartJobsRequest::for_process(process_key));
        let envelope: ListEnvelope<StartResult> = self.send("start_process", request).await?;
        Ok(envelope.into_items())
    }
}

/// Pull a readable message out of an OData error body
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("error").and_then(|error| error.get("message")))
            .and_then(|message| message.as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
        None => body.chars().take(200).collect(),
    }
}
