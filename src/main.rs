use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::Instrument;

use process_dashboard::cli::commands::config::ConfigCommand;
use process_dashboard::cli::commands::dashboard::DashboardCommand;
use process_dashboard::cli::commands::list::ListCommand;
use process_dashboard::cli::commands::show::ShowCommand;
use process_dashboard::cli::commands::start::StartCommand;
use process_dashboard::cli::{Cli, Commands};
use process_dashboard::{
    create_session_span, generate_correlation_id, init_telemetry, shutdown_telemetry,
    DashboardConfig, DashboardContext, ShutdownCoordinator, ToastQueue,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    DashboardConfig::load_env_file()?;
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(folder_id) = cli.folder_id {
        config.orchestrator.folder_id = folder_id;
    }
    init_telemetry(&config.observability)?;

    let command = cli.command.unwrap_or(Commands::Dashboard { once: false });
    if let Commands::Config { write } = command {
        return ConfigCommand::new(write).execute(&config);
    }

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        let span = create_session_span(command.name(), config.orchestrator.folder_id, &generate_correlation_id());
        run(command, &config).instrument(span).await
    });

    shutdown_telemetry();
    result
}

async fn run(command: Commands, config: &DashboardConfig) -> Result<()> {
    let toasts = Arc::new(ToastQueue::new());
    let ctx = match DashboardContext::from_config(config, toasts.clone()) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            println!("❌ Configuration error: {e}");
            println!();
            println!("🔧 QUICK FIXES:");
            println!("   → Create process-dashboard.toml: process-dashboard config --write process-dashboard.toml");
            println!("   → Set the secret: export ORCHESTRATOR_SECRET=your_secret");
            println!("   → Set the folder: export PROCESS_DASHBOARD_ORCHESTRATOR__FOLDER_ID=123456");
            return Err(e);
        }
    };

    let shutdown = Arc::new(ShutdownCoordinator::new());
    shutdown.install_signal_handlers();

    let result = match command {
        Commands::Dashboard { once } => {
            DashboardCommand::new(once)
                .execute(ctx.clone(), toasts.clone(), shutdown.clone())
                .await
        }
        Commands::List { json } => ListCommand::new(json).execute(&ctx).await,
        Commands::Show { process_id } => ShowCommand::new(process_id).execute(&ctx).await,
        Commands::Start { process_key } => StartCommand::new(process_key).execute(&ctx, &toasts).await,
        Commands::Config { write } => ConfigCommand::new(write).execute(config),
    };

    shutdown.finish(&ctx.metrics, config.observability.metrics_enabled);
    result
}
