use anyhow::Result;

use crate::cli::commands::format_error;
use crate::context::DashboardContext;
use crate::notify::{NotificationLevel, ToastQueue};
use crate::orchestrator::StartResult;
use crate::query::{StartProcessInput, StartProcessMutation};
use crate::ui::JobStatusBadge;

pub struct StartCommand {
    pub process_key: String,
}

impl StartCommand {
    pub fn new(process_key: String) -> Self {
        Self { process_key }
    }

    pub async fn execute(&self, ctx: &DashboardContext, toasts: &ToastQueue) -> Result<()> {
        println!("🚀 Starting process {} in folder {}...", self.process_key, ctx.folder_id);

        let mutation = StartProcessMutation::new();
        let outcome = mutation
            .mutate(ctx, StartProcessInput::new(self.process_key.clone(), ctx.folder_id))
            .await;

        for toast in toasts.drain() {
            let icon = match toast.level {
                NotificationLevel::Success => "✅",
                NotificationLevel::Error => "❌",
            };
            println!("{icon} {}", toast.message);
        }

        match outcome {
            Ok(jobs) => {
                print!("{}", render_jobs(&jobs));
                Ok(())
            }
            Err(error) => {
                println!();
                print!("{}", format_error("Start request rejected", &error));
                Err(error.into())
            }
        }
    }
}

fn render_jobs(jobs: &[StartResult]) -> String {
    if jobs.is_empty() {
        return "   No job details returned\n".to_string();
    }
    let mut out = String::new();
    for job in jobs {
        let name = job.release_name.as_deref().unwrap_or("job");
        out.push_str(&format!(
            "   {} {} #{} {}\n",
            JobStatusBadge::for_raw(&job.state),
            name,
            job.id,
            job.key
        ));
    }
    out
}
