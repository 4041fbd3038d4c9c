use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "process-dashboard")]
#[command(about = "Terminal dashboard for Orchestrator automation processes")]
#[command(long_about = "Lists the automation processes of an Orchestrator folder, keeps the list fresh \
                       while open, and starts processes on demand. Run without a subcommand to open \
                       the interactive dashboard.")]
pub struct Cli {
    /// Configuration file (defaults to ./process-dashboard.toml when present)
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Override the configured folder
    #[arg(long, global = true, help = "Orchestrator folder id (overrides orchestrator.folder_id)")]
    pub folder_id: Option<i64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the live dashboard (default)
    Dashboard {
        /// Render once and exit instead of polling
        #[arg(long, help = "Fetch and render a single time, then exit")]
        once: bool,
    },
    /// List processes in the folder
    List {
        #[arg(long, help = "Print the processes as JSON")]
        json: bool,
    },
    /// Show a single process by id
    Show {
        /// Numeric process id
        process_id: Option<i64>,
    },
    /// Start a process by key
    Start {
        /// Process (release) key
        process_key: String,
    },
    /// Print the effective configuration or write it to a file
    Config {
        #[arg(long, help = "Write the configuration (secret included) to this path")]
        write: Option<PathBuf>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Dashboard { .. } => "dashboard",
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::Start { .. } => "start",
            Commands::Config { .. } => "config",
        }
    }
}
