use crate::notify::{Notification, NotificationLevel};
use crate::orchestrator::Process;
use crate::query::QueryResult;
use crate::ui::card::ProcessCard;

const SKELETON_CARDS: usize = 3;

/// The single dashboard page: header, error alert, process grid and toasts
#[derive(Debug)]
pub struct HomePage<'a> {
    pub processes: &'a QueryResult<Vec<Process>>,
    pub is_starting: bool,
    pub toasts: &'a [Notification],
    pub show_controls: bool,
}

impl<'a> HomePage<'a> {
    pub fn new(processes: &'a QueryResult<Vec<Process>>) -> Self {
        Self {
            processes,
            is_starting: false,
            toasts: &[],
            show_controls: false,
        }
    }

    pub fn starting(mut self, is_starting: bool) -> Self {
        self.is_starting = is_starting;
        self
    }

    pub fn with_toasts(mut self, toasts: &'a [Notification]) -> Self {
        self.toasts = toasts;
        self
    }

    pub fn with_controls(mut self, show_controls: bool) -> Self {
        self.show_controls = show_controls;
        self
    }

    /// Cards for the current data; empty while loading or when nothing is cached
    pub fn cards(&self) -> Vec<ProcessCard> {
        self.processes
            .data
            .iter()
            .flatten()
            .map(|process| ProcessCard::new(process, self.is_starting))
            .collect()
    }

    pub fn error_alert(&self) -> Option<String> {
        self.processes
            .error
            .as_ref()
            .map(|error| format!("Failed to load processes: {error}"))
    }

    fn is_initial_load(&self) -> bool {
        self.processes.is_loading && self.processes.data.is_none()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("📊 PROCESS DASHBOARD\n");
        out.push_str("Monitor and manage your Orchestrator processes\n");
        if let Some(fetched_at) = self.processes.last_fetched_at {
            out.push_str(&format!("Last refreshed {}\n", fetched_at.format("%H:%M:%S UTC")));
        }
        out.push_str("══════════════════════════════════════════════════\n");
        out.push('\n');

        if let Some(alert) = self.error_alert() {
            out.push_str("❌ Error\n");
            out.push_str(&format!("   {alert}\n"));
            out.push('\n');
        }

        if self.is_initial_load() {
            for _ in 0..SKELETON_CARDS {
                out.push_str("░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░\n");
            }
        } else {
            let cards = self.cards();
            if cards.is_empty() {
                out.push_str("📭 No processes found\n");
                out.push_str("   Create processes in Orchestrator to see them here.\n");
            } else {
                for card in &cards {
                    out.push_str(&card.render());
                }
            }
        }

        if !self.toasts.is_empty() {
            out.push('\n');
            for toast in self.toasts {
                let icon = match toast.level {
                    NotificationLevel::Success => "✅",
                    NotificationLevel::Error => "❌",
                };
                out.push_str(&format!("{icon} {}\n", toast.message));
            }
        }

        if self.show_controls {
            out.push('\n');
            out.push_str("🎯 r = refresh · s <key> = start process · q = quit\n");
        }

        out
    }
}
