use anyhow::Result;

use crate::cli::commands::format_error;
use crate::context::DashboardContext;
use crate::orchestrator::Process;
use crate::query::ProcessQuery;

pub struct ShowCommand {
    pub process_id: Option<i64>,
}

impl ShowCommand {
    pub fn new(process_id: Option<i64>) -> Self {
        Self { process_id }
    }

    pub async fn execute(&self, ctx: &DashboardContext) -> Result<()> {
        let result = ProcessQuery::new(self.process_id, ctx.folder_id).fetch(ctx).await;

        match result.into_result() {
            Ok(Some(process)) => {
                print!("{}", describe(&process, ctx.folder_id));
                Ok(())
            }
            Ok(None) => {
                println!("📭 Process not loaded");
                Ok(())
            }
            Err(error) => {
                print!("{}", format_error("Failed to load process", &error));
                Err(error.into())
            }
        }
    }
}

fn describe(process: &Process, folder_id: i64) -> String {
    let mut out = String::new();
    out.push_str(&format!("⚙️  {}\n", process.name));
    out.push_str(&format!("   🆔 Id: {}\n", process.id));
    out.push_str(&format!("   🔑 Key: {}\n", process.key));
    out.push_str(&format!("   📂 Folder: {folder_id}\n"));
    if !process.description.is_empty() {
        out.push_str(&format!("   📄 Description: {}\n", process.description));
    }
    out.push_str(&format!("\n💡 Start it with: process-dashboard start {}\n", process.key));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_fields() {
        let process = Process {
            id: 1,
            name: "Invoice Bot".to_string(),
            key: "abc".to_string(),
            description: String::new(),
        };
        let rendered = describe(&process, 1878866);
        assert!(rendered.contains("Key: abc"));
        assert!(rendered.contains("Folder: 1878866"));
        assert!(!rendered.contains("Description"));
    }
}
