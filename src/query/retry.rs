// Retry policy for queries: exponential backoff, transient errors only.

use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::orchestrator::OrchestratorError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &QueryConfig) -> Self {
        Self {
            retries: config.retry,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delays of base, 2*base, 4*base... capped at `max_delay`
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let half_base = (self.base_delay.as_millis() as u64) / 2;
        ExponentialBackoff::from_millis(2)
            .factor(half_base)
            .max_delay(self.max_delay)
            .take(self.retries as usize)
    }

    /// Run `operation`, retrying retryable failures per policy
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, OrchestratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        let mut attempt = 0u32;
        RetryIf::spawn(
            self.delays(),
            || {
                attempt += 1;
                debug!(operation = operation_name, attempt, "Running query attempt");
                operation()
            },
            |error: &OrchestratorError| {
                let retry = error.is_retryable();
                if retry {
                    warn!(operation = operation_name, error = %error, "Query failed, retrying");
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delays_double_from_base() {
        let policy = RetryPolicy {
            retries: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        };
        let delays: Vec<u64> = policy.delays().map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failure() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = policy
            .run("test", move || {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count == 0 {
                        Err(OrchestratorError::Transport("connection refused".into()))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("success"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_retry_then_gives_up() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<(), _> = policy
            .run("test", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(OrchestratorError::Transport("down".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<(), _> = policy
            .run("test", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(OrchestratorError::Api { status: 401, message: "unauthorized".into() }) }
            })
            .await;

        assert!(result.is_err());
        // Should fail immediately without retries
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
