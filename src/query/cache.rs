use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::observability::ApiMetrics;
use crate::orchestrator::OrchestratorError;
use crate::query::key::QueryKey;
use crate::query::retry::RetryPolicy;

const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

/// Typed view of a cached query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub error: Option<OrchestratorError>,
    pub is_loading: bool,
    /// Invalidated since the last successful fetch
    pub is_stale: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> QueryResult<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_stale: false,
            last_fetched_at: None,
        }
    }

    pub fn failed(error: OrchestratorError) -> Self {
        Self {
            error: Some(error),
            ..Self::idle()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error wins over stale data
    pub fn into_result(self) -> Result<Option<T>, OrchestratorError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Option<serde_json::Value>,
    error: Option<OrchestratorError>,
    is_stale: bool,
    last_fetched_at: Option<DateTime<Utc>>,
    /// Bumped on every completed fetch
    generation: u64,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            data: None,
            error: None,
            is_stale: false,
            last_fetched_at: None,
            generation: 0,
        }
    }

    fn decode<T: DeserializeOwned>(&self, is_loading: bool) -> QueryResult<T> {
        let data = self.data.clone().and_then(|value| match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Discarding cached value that no longer decodes: {}", e);
                None
            }
        });
        QueryResult {
            data,
            error: self.error.clone(),
            is_loading,
            is_stale: self.is_stale,
            last_fetched_at: self.last_fetched_at,
        }
    }
}

/// Keyed cache of query results, shared by every data-access call.
#[derive(Clone)]
pub struct QueryClient {
    entries: Cache<QueryKey, CacheEntry>,
    in_flight: Cache<QueryKey, Arc<Mutex<()>>>,
    invalidations: broadcast::Sender<QueryKey>,
    retry: RetryPolicy,
    metrics: Arc<ApiMetrics>,
}

impl QueryClient {
    pub fn new(capacity: u64, retry: RetryPolicy, metrics: Arc<ApiMetrics>) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            in_flight: Cache::builder().max_capacity(capacity).build(),
            invalidations,
            retry,
            metrics,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Current state of `key` without touching the network
    pub async fn snapshot<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryResult<T> {
        let is_loading = self.is_fetching(key).await;
        match self.entries.get(key).await {
            Some(entry) => entry.decode(is_loading),
            None => QueryResult {
                is_loading,
                ..QueryResult::idle()
            },
        }
    }

    /// A fetch holds the key's lock for exactly as long as it runs, so a
    /// dropped or aborted fetch stops counting as loading.
    async fn is_fetching(&self, key: &QueryKey) -> bool {
        match self.in_flight.get(key).await {
            Some(lock) => lock.try_lock().is_err(),
            None => false,
        }
    }

    /// Run `fetcher` for `key` and record the outcome.
    ///
    /// Callers arriving while a fetch for the same key is running wait for it and
    /// share its outcome, success or failure. A failed fetch keeps the previously
    /// cached data.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        let lock = self
            .in_flight
            .get_with(key.clone(), async { Arc::new(Mutex::new(())) })
            .await;
        let seen_generation = self.entries.get(key).await.map_or(0, |entry| entry.generation);

        let _guard = lock.lock().await;

        let mut entry = self.entries.get(key).await.unwrap_or_else(CacheEntry::empty);
        if entry.generation != seen_generation {
            debug!(key = %key, "Reusing result of concurrent fetch");
            self.metrics.record_deduplicated_fetch();
            return entry.decode(false);
        }

        let outcome = self.retry.run(&key.to_string(), fetcher).await;

        entry.generation += 1;
        entry.last_fetched_at = Some(Utc::now());
        match outcome {
            Ok(data) => match serde_json::to_value(&data) {
                Ok(value) => {
                    entry.data = Some(value);
                    entry.error = None;
                    entry.is_stale = false;
                }
                Err(e) => {
                    entry.error = Some(OrchestratorError::InvalidResponse(e.to_string()));
                }
            },
            Err(error) => {
                debug!(key = %key, error = %error, "Query failed; keeping previous data");
                entry.error = Some(error);
            }
        }
        self.entries.insert(key.clone(), entry.clone()).await;

        entry.decode(false)
    }

    /// Mark every entry under `prefix` stale and notify subscribers once.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let matching: Vec<(QueryKey, CacheEntry)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.as_ref().clone(), entry))
            .collect();

        let count = matching.len();
        for (key, mut entry) in matching {
            entry.is_stale = true;
            self.entries.insert(key, entry).await;
        }

        self.metrics.record_invalidation();
        // No receivers is fine; nothing is polling.
        let _ = self.invalidations.send(prefix.clone());
        info!(prefix = %prefix, entries = count, "Invalidated queries");
        count
    }

    /// Invalidation events, one per `invalidate` call
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        debug!("Query cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn client() -> QueryClient {
        QueryClient::new(64, RetryPolicy::none(), Arc::new(ApiMetrics::new()))
    }

    #[tokio::test]
    async fn test_fetch_stores_data() {
        let queries = client();
        let key = QueryKey::process_list(Some(1));

        let result = queries.fetch(&key, || async { Ok(vec![1, 2, 3]) }).await;
        assert_eq!(result.data, Some(vec![1, 2, 3]));
        assert!(result.error.is_none());
        assert!(!result.is_loading);
        assert!(result.last_fetched_at.is_some());

        let snapshot: QueryResult<Vec<i32>> = queries.snapshot(&key).await;
        assert_eq!(snapshot.data, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let queries = client();
        let key = QueryKey::process_list(Some(1));

        queries.fetch(&key, || async { Ok(vec!["a".to_string()]) }).await;
        let result: QueryResult<Vec<String>> = queries
            .fetch(&key, || async { Err(OrchestratorError::Transport("offline".into())) })
            .await;

        assert_eq!(result.data, Some(vec!["a".to_string()]));
        assert_eq!(result.error, Some(OrchestratorError::Transport("offline".into())));

        // A later success clears the error
        let result = queries.fetch(&key, || async { Ok(vec!["b".to_string()]) }).await;
        assert!(result.error.is_none());
        assert_eq!(result.data, Some(vec!["b".to_string()]));
    }

    #[tokio::test]
    async fn test_snapshot_of_unknown_key_is_idle() {
        let queries = client();
        let snapshot: QueryResult<Vec<i32>> = queries.snapshot(&QueryKey::process(1, 2)).await;
        assert_eq!(snapshot, QueryResult::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_share_one_request() {
        let queries = client();
        let key = QueryKey::process_list(Some(7));
        let calls = Arc::new(AtomicU32::new(0));

        let fetch = |calls: Arc<AtomicU32>| {
            let queries = queries.clone();
            let key = key.clone();
            async move {
                queries
                    .fetch(&key, move || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(42)
                        }
                    })
                    .await
            }
        };

        let (first, second) = tokio::join!(fetch(calls.clone()), fetch(calls.clone()));
        assert_eq!(first.data, Some(42));
        assert_eq!(second.data, Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_marks_prefix_and_notifies_once() {
        let queries = client();
        let mut events = queries.subscribe();

        queries.fetch(&QueryKey::process_list(Some(1)), || async { Ok(1) }).await;
        queries.fetch(&QueryKey::process_list(Some(2)), || async { Ok(2) }).await;
        queries
            .fetch(&QueryKey::new(["orchestrator", "jobs"]), || async { Ok(3) })
            .await;

        let count = queries.invalidate(&QueryKey::processes()).await;
        assert_eq!(count, 2);
        assert_eq!(events.try_recv().unwrap(), QueryKey::processes());
        assert!(events.try_recv().is_err());

        let stale: QueryResult<i32> = queries.snapshot(&QueryKey::process_list(Some(1))).await;
        assert!(stale.is_stale);
        let untouched: QueryResult<i32> = queries.snapshot(&QueryKey::new(["orchestrator", "jobs"])).await;
        assert!(!untouched.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failures_share_one_request() {
        let queries = client();
        let key = QueryKey::process_list(Some(7));
        let calls = Arc::new(AtomicU32::new(0));

        let fetch = |calls: Arc<AtomicU32>| {
            let queries = queries.clone();
            let key = key.clone();
            async move {
                queries
                    .fetch(&key, move || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Err::<i32, _>(OrchestratorError::Transport("offline".into()))
                        }
                    })
                    .await
            }
        };

        let (first, second) = tokio::join!(fetch(calls.clone()), fetch(calls.clone()));
        assert_eq!(first.error, Some(OrchestratorError::Transport("offline".into())));
        assert_eq!(second.error, first.error);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_loading_while_fetching() {
        let queries = client();
        let key = QueryKey::process_list(Some(3));

        let running = {
            let queries = queries.clone();
            let key = key.clone();
            tokio::spawn(async move {
                queries
                    .fetch(&key, || async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Ok(5)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let during: QueryResult<i32> = queries.snapshot(&key).await;
        assert!(during.is_loading);

        assert_eq!(running.await.unwrap().data, Some(5));
        let after: QueryResult<i32> = queries.snapshot(&key).await;
        assert!(!after.is_loading);
        assert_eq!(after.data, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_fetch_does_not_stay_loading() {
        let queries = client();
        let key = QueryKey::process_list(Some(4));

        let running = {
            let queries = queries.clone();
            let key = key.clone();
            tokio::spawn(async move {
                queries
                    .fetch(&key, || async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());
        tokio::time::sleep(Duration::from_secs(60)).await;

        let snapshot: QueryResult<i32> = queries.snapshot(&key).await;
        assert!(!snapshot.is_loading);
        assert!(snapshot.data.is_none());

        // The key is usable again after the abort
        let result = queries.fetch(&key, || async { Ok(2) }).await;
        assert_eq!(result.data, Some(2));
    }
}
