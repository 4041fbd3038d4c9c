use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument};

use crate::context::DashboardContext;
use crate::orchestrator::{OrchestratorError, Process, StartResult};
use crate::query::cache::QueryResult;
use crate::query::key::QueryKey;

pub const PROCESS_ID_REQUIRED: &str = "Process ID is required";
pub const PROCESS_KEY_REQUIRED: &str = "Process key is required";

/// All processes, optionally limited to one folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessListQuery {
    pub folder_id: Option<i64>,
    pub enabled: bool,
}

impl ProcessListQuery {
    pub fn new(folder_id: Option<i64>) -> Self {
        Self {
            folder_id,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::process_list(self.folder_id)
    }

    /// Fetch the list; a disabled query only reports what is cached.
    #[instrument(skip(self, ctx), fields(folder_id = ?self.folder_id))]
    pub async fn fetch(&self, ctx: &DashboardContext) -> QueryResult<Vec<Process>> {
        let key = self.key();
        if !self.enabled {
            debug!("Process list query disabled; skipping fetch");
            return ctx.queries.snapshot(&key).await;
        }

        let folder_id = self.folder_id;
        let service = &ctx.service;
        ctx.queries
            .fetch(&key, || service.list_processes(folder_id))
            .await
    }
}

/// A single process by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessQuery {
    pub process_id: Option<i64>,
    pub folder_id: i64,
}

impl ProcessQuery {
    pub fn new(process_id: Option<i64>, folder_id: i64) -> Self {
        Self {
            process_id,
            folder_id,
        }
    }

    pub fn key(&self) -> Option<QueryKey> {
        self.process_id
            .map(|process_id| QueryKey::process(process_id, self.folder_id))
    }

    /// Fails with a validation error, without any request, when the id is absent.
    pub async fn fetch(&self, ctx: &DashboardContext) -> QueryResult<Process> {
        let Some(process_id) = self.process_id else {
            return QueryResult::failed(OrchestratorError::validation(PROCESS_ID_REQUIRED));
        };

        let folder_id = self.folder_id;
        let service = &ctx.service;
        ctx.queries
            .fetch(&QueryKey::process(process_id, folder_id), || {
                service.get_process(process_id, folder_id)
            })
            .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartProcessInput {
    pub process_key: String,
    pub folder_id: i64,
}

impl StartProcessInput {
    pub fn new(process_key: impl Into<String>, folder_id: i64) -> Self {
        Self {
            process_key: process_key.into(),
            folder_id,
        }
    }
}

/// Starts processes; every success refreshes the process lists.
#[derive(Debug, Default)]
pub struct StartProcessMutation {
    in_flight: AtomicUsize,
}

/// Counts one start request until dropped, including when the call is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StartProcessMutation {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any start request is in flight
    pub fn is_pending(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Not retried; two calls issue two start requests.
    #[instrument(skip(self, ctx), fields(process_key = %input.process_key, folder_id = input.folder_id))]
    pub async fn mutate(
        &self,
        ctx: &DashboardContext,
        input: StartProcessInput,
    ) -> Result<Vec<StartResult>, OrchestratorError> {
        let outcome = if input.process_key.trim().is_empty() {
            Err(OrchestratorError::validation(PROCESS_KEY_REQUIRED))
        } else {
            let _in_flight = InFlight::enter(&self.in_flight);
            ctx.service
                .start_process(&input.process_key, input.folder_id)
                .await
        };

        match &outcome {
            Ok(jobs) => {
                info!(jobs = jobs.len(), "Process started");
                ctx.notifier.success("Process started successfully");
                ctx.queries.invalidate(&QueryKey::processes()).await;
            }
            Err(error) => {
                ctx.notifier
                    .error(&format!("Failed to start process: {error}"));
            }
        }
        outcome
    }
}
