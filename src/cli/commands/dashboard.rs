use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::DashboardContext;
use crate::notify::{Notification, ToastQueue};
use crate::orchestrator::Process;
use crate::query::{
    ProcessListPoller, ProcessListQuery, QueryResult, StartProcessInput, StartProcessMutation,
};
use crate::shutdown::ShutdownCoordinator;
use crate::ui::{HomePage, CLEAR_SCREEN};

/// A line typed into the running dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardInput {
    Refresh,
    Start(String),
    Quit,
    Help,
}

impl DashboardInput {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?;
        match command.to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(DashboardInput::Refresh),
            "q" | "quit" | "exit" => Some(DashboardInput::Quit),
            "s" | "start" => parts.next().map(|key| DashboardInput::Start(key.to_string())),
            "h" | "help" | "?" => Some(DashboardInput::Help),
            _ => None,
        }
    }
}

pub struct DashboardCommand {
    pub once: bool,
}

impl DashboardCommand {
    pub fn new(once: bool) -> Self {
        Self { once }
    }

    pub async fn execute(
        &self,
        ctx: Arc<DashboardContext>,
        toasts: Arc<ToastQueue>,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Result<()> {
        self.execute_with_input(ctx, toasts, shutdown, BufReader::new(tokio::io::stdin()))
            .await
    }

    /// Run the dashboard reading commands line by line from `input`
    pub async fn execute_with_input<R>(
        &self,
        ctx: Arc<DashboardContext>,
        toasts: Arc<ToastQueue>,
        shutdown: Arc<ShutdownCoordinator>,
        input: R,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let query = ProcessListQuery::new(Some(ctx.folder_id));

        if self.once {
            let result = query.fetch(&ctx).await;
            print!("{}", HomePage::new(&result).render());
            return Ok(());
        }

        let mut poller = ProcessListPoller::spawn(ctx.clone(), query, shutdown.subscribe());
        let mutation = Arc::new(StartProcessMutation::new());
        let (redraw_tx, mut redraw_rx) = mpsc::channel::<()>(8);
        let mut lines = input.lines();
        let mut input_open = true;
        let mut shutdown_rx = shutdown.subscribe();

        let mut latest: QueryResult<Vec<Process>> = QueryResult {
            is_loading: true,
            ..QueryResult::idle()
        };
        let mut shown_toasts: Vec<Notification> = Vec::new();
        let mut status_line: Option<String> = None;
        redraw(&latest, mutation.is_pending(), &shown_toasts, status_line.as_deref());

        loop {
            tokio::select! {
                update = poller.next() => match update {
                    Some(result) => latest = result,
                    None => break,
                },
                _ = redraw_rx.recv() => {}
                line = lines.next_line(), if input_open => match line {
                    Ok(Some(line)) => match DashboardInput::parse(&line) {
                        Some(DashboardInput::Refresh) => {
                            status_line = Some("🔄 Refreshing...".to_string());
                            poller.refetch();
                        }
                        Some(DashboardInput::Start(process_key)) => {
                            status_line = Some(format!("🚀 Starting {process_key}..."));
                            spawn_start(ctx.clone(), mutation.clone(), process_key, redraw_tx.clone());
                        }
                        Some(DashboardInput::Quit) => break,
                        Some(DashboardInput::Help) | None => {
                            status_line = Some("🎯 r = refresh · s <key> = start process · q = quit".to_string());
                        }
                    },
                    Ok(None) => {
                        debug!("Input closed; dashboard keeps polling until Ctrl-C");
                        input_open = false;
                    }
                    Err(e) => {
                        debug!("Failed to read input: {}", e);
                        input_open = false;
                    }
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }

            let fresh = toasts.drain();
            if !fresh.is_empty() {
                status_line = None;
                shown_toasts = fresh;
            }
            redraw(&latest, mutation.is_pending(), &shown_toasts, status_line.as_deref());
        }

        shutdown.trigger();
        poller.stop().await;
        info!("Dashboard closed");
        Ok(())
    }
}

fn spawn_start(
    ctx: Arc<DashboardContext>,
    mutation: Arc<StartProcessMutation>,
    process_key: String,
    redraw: mpsc::Sender<()>,
) {
    tokio::spawn(async move {
        let input = StartProcessInput::new(process_key, ctx.folder_id);
        // Outcome reaches the screen through the toast queue.
        let _ = mutation.mutate(&ctx, input).await;
        let _ = redraw.send(()).await;
    });
}

fn redraw(
    processes: &QueryResult<Vec<Process>>,
    is_starting: bool,
    toasts: &[Notification],
    status_line: Option<&str>,
) {
    let page = HomePage::new(processes)
        .starting(is_starting)
        .with_toasts(toasts)
        .with_controls(true)
        .render();
    print!("{CLEAR_SCREEN}{page}");
    if let Some(status) = status_line {
        println!("{status}");
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}
