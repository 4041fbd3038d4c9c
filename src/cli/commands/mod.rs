use crate::orchestrator::OrchestratorError;

pub mod config;
pub mod dashboard;
pub mod list;
pub mod show;
pub mod start;

/// Error block shown under a failed command
pub fn format_error(context: &str, error: &OrchestratorError) -> String {
    let mut out = format!("❌ {context}: {error}\n");
    let hints = error.troubleshooting();
    if !hints.is_empty() {
        out.push_str("\n🔧 TROUBLESHOOTING:\n");
        for hint in hints {
            out.push_str(&format!("   → {hint}\n"));
        }
    }
    out
}
