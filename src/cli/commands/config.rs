use anyhow::Result;
use std::path::PathBuf;

use crate::config::DashboardConfig;

pub struct ConfigCommand {
    pub write: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(write: Option<PathBuf>) -> Self {
        Self { write }
    }

    /// Works without a valid configuration so users can bootstrap one.
    pub fn execute(&self, config: &DashboardConfig) -> Result<()> {
        match &self.write {
            Some(path) => {
                config.save_to_file(path)?;
                println!("✅ Configuration written to {}", path.display());
            }
            None => {
                print!("{}", config.redacted().to_toml()?);
                if let Err(e) = config.validate() {
                    println!();
                    println!("⚠️  Configuration is incomplete: {e}");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("process-dashboard.toml");
        let mut config = DashboardConfig::default();
        config.orchestrator.org_name = "acme".to_string();
        config.orchestrator.folder_id = 1878866;

        ConfigCommand::new(Some(path.clone())).execute(&config).unwrap();

        let loaded = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.orchestrator.org_name, "acme");
        assert_eq!(loaded.orchestrator.folder_id, 1878866);
    }
}
