use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::context::DashboardContext;
use crate::orchestrator::Process;
use crate::query::cache::QueryResult;
use crate::query::processes::ProcessListQuery;

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Keeps a process list fresh while the dashboard is open.
///
/// Refetches on the context's refetch interval, whenever a matching key is
/// invalidated, and on [`ProcessListPoller::refetch`]. Polls never overlap.
/// Stopping, by shutdown or [`ProcessListPoller::stop`], only prevents new
/// polls; a request already on the wire runs to completion.
pub struct ProcessListPoller {
    refresh: Arc<Notify>,
    halt: Arc<Notify>,
    updates: mpsc::Receiver<QueryResult<Vec<Process>>>,
    task: JoinHandle<()>,
}

impl ProcessListPoller {
    pub fn spawn(
        ctx: Arc<DashboardContext>,
        query: ProcessListQuery,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let refresh = Arc::new(Notify::new());
        let halt = Arc::new(Notify::new());
        let (tx, updates) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let manual = refresh.clone();
        let halted = halt.clone();

        let task = tokio::spawn(async move {
            let key = query.key();
            let mut invalidations = ctx.queries.subscribe();
            let mut ticker = interval(ctx.list_refetch_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(key = %key, interval_secs = ctx.list_refetch_interval.as_secs(), "Process list poller started");

            loop {
                tokio::select! {
                    biased;

                    _ = halted.notified() => break,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {
                        debug!(key = %key, "Refetch interval elapsed");
                    }
                    _ = manual.notified() => {
                        debug!(key = %key, "Manual refetch requested");
                        ticker.reset();
                    }
                    event = invalidations.recv() => match event {
                        Ok(prefix) if key.starts_with(&prefix) => {
                            debug!(key = %key, prefix = %prefix, "Refetching invalidated list");
                            ticker.reset();
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Missed invalidations; refetching");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }

                let result = query.fetch(&ctx).await;
                if tx.send(result).await.is_err() {
                    break;
                }
            }
            info!(key = %key, "Process list poller stopped");
        });

        Self {
            refresh,
            halt,
            updates,
            task,
        }
    }

    /// Ask for an immediate refetch
    pub fn refetch(&self) {
        self.refresh.notify_one();
    }

    /// Next published result; `None` once the poller has stopped
    pub async fn next(&mut self) -> Option<QueryResult<Vec<Process>>> {
        self.updates.recv().await
    }

    /// Stop polling and wait for the loop to exit, letting an in-flight poll finish
    pub async fn stop(self) {
        let Self {
            halt,
            updates,
            task,
            ..
        } = self;
        halt.notify_one();
        // Unblocks a loop waiting to publish into a full channel.
        drop(updates);
        if let Err(e) = task.await {
            warn!("Process list poller task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::notify::ToastQueue;
    use crate::observability::ApiMetrics;
    use crate::orchestrator::{MockProcessService, OrchestratorError, ProcessService, StartResult};
    use async_trait::async_trait;
    use crate::query::key::QueryKey;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn context(service: MockProcessService) -> Arc<DashboardContext> {
        context_with(Arc::new(service))
    }

    fn context_with(service: Arc<dyn ProcessService>) -> Arc<DashboardContext> {
        let mut config = DashboardConfig::default();
        config.orchestrator.folder_id = 1878866;
        config.query.retry = 0;
        Arc::new(DashboardContext::new(
            service,
            Arc::new(ToastQueue::new()),
            &config,
            Arc::new(ApiMetrics::new()),
        ))
    }

    /// List calls take two seconds, like a slow tenant
    struct SlowListService {
        started: AtomicU32,
        completed: AtomicU32,
    }

    #[async_trait]
    impl ProcessService for SlowListService {
        async fn list_processes(&self, _folder_id: Option<i64>) -> Result<Vec<Process>, OrchestratorError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(2)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn get_process(&self, process_id: i64, folder_id: i64) -> Result<Process, OrchestratorError> {
            Err(OrchestratorError::NotFound { process_id, folder_id })
        }

        async fn start_process(&self, _process_key: &str, _folder_id: i64) -> Result<Vec<StartResult>, OrchestratorError> {
            Ok(vec![])
        }
    }

    fn counting_service(calls: Arc<AtomicU32>) -> MockProcessService {
        let mut service = MockProcessService::new();
        service.expect_list_processes().returning(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        });
        service
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_interval() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = context(counting_service(calls.clone()));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller = ProcessListPoller::spawn(ctx, ProcessListQuery::new(Some(1878866)), shutdown_rx);

        let started = tokio::time::Instant::now();
        assert!(poller.next().await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(poller.next().await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(30));

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_triggers_refetch() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = context(counting_service(calls.clone()));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller =
            ProcessListPoller::spawn(ctx.clone(), ProcessListQuery::new(Some(1878866)), shutdown_rx);
        poller.next().await;

        let before = tokio::time::Instant::now();
        ctx.queries.invalidate(&QueryKey::processes()).await;
        poller.next().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(before.elapsed() < Duration::from_secs(30));
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refetch() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = context(counting_service(calls.clone()));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller = ProcessListPoller::spawn(ctx, ProcessListQuery::new(None), shutdown_rx);
        poller.next().await;
        poller.refetch();
        poller.next().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_query_publishes_without_fetching() {
        let mut service = MockProcessService::new();
        service.expect_list_processes().never();
        let ctx = context(service);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller =
            ProcessListPoller::spawn(ctx, ProcessListQuery::new(Some(1)).enabled(false), shutdown_rx);
        let result = poller.next().await.unwrap();
        assert_eq!(result, QueryResult::idle());
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_poll_finish() {
        let service = Arc::new(SlowListService {
            started: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        });
        let ctx = context_with(service.clone());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let query = ProcessListQuery::new(Some(1878866));

        let poller = ProcessListPoller::spawn(ctx.clone(), query, shutdown_rx);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(service.started.load(Ordering::SeqCst), 1);

        poller.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(service.completed.load(Ordering::SeqCst), 1);
        assert_eq!(service.started.load(Ordering::SeqCst), 1);
        let cached: QueryResult<Vec<Process>> = ctx.queries.snapshot(&query.key()).await;
        assert!(!cached.is_loading);
        assert_eq!(cached.data, Some(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_poller() {
        let mut service = MockProcessService::new();
        service
            .expect_list_processes()
            .returning(|_| Err(OrchestratorError::Transport("offline".into())));
        let ctx = context(service);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller = ProcessListPoller::spawn(ctx, ProcessListQuery::new(None), shutdown_rx);
        assert!(poller.next().await.unwrap().is_error());

        shutdown_tx.send(true).unwrap();
        assert!(poller.next().await.is_none());
    }
}
