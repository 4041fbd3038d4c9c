use anyhow::{anyhow, Result};

use crate::cli::commands::format_error;
use crate::context::DashboardContext;
use crate::query::ProcessListQuery;
use crate::ui::HomePage;

pub struct ListCommand {
    pub json: bool,
}

impl ListCommand {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub async fn execute(&self, ctx: &DashboardContext) -> Result<()> {
        let result = ProcessListQuery::new(Some(ctx.folder_id)).fetch(ctx).await;

        if self.json {
            if let Some(error) = &result.error {
                eprint!("{}", format_error("Failed to load processes", error));
                return Err(anyhow!(error.clone()));
            }
            let processes = result.data.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&processes)?);
            return Ok(());
        }

        print!("{}", HomePage::new(&result).render());
        match result.error {
            Some(error) => {
                println!();
                print!("{}", format_error("Failed to load processes", &error));
                Err(error.into())
            }
            None => Ok(()),
        }
    }
}
