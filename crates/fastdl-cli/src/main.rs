use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use fastdl_cli::{Command, Config};
use fastdl_core::{FastDlConfig, TracingSink, TriggerOutcome, Updater};
use fastdl_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Config::parse();

    // Setup logging (stderr to keep stdout clean)
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e).context("Failed to load configuration");
        }
    };

    match cli.command {
        Command::Serve { host, .. } => serve(config, &host).await,
        Command::Run => run_once(config).await,
    }
}

/// Serve the download tree and the update WebSocket
async fn serve(config: FastDlConfig, host: &str) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, config.port);
    info!(
        port = config.port,
        output_root = %config.output_root.display(),
        "FastDL starting up"
    );

    let updater = Arc::new(Updater::new(config));
    fastdl_server::serve(AppState::new(updater), &addr)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}

/// Run one update, logging every progress event
async fn run_once(config: FastDlConfig) -> anyhow::Result<()> {
    let updater = Updater::new(config);

    match updater.trigger_now(&TracingSink).await {
        TriggerOutcome::Completed(Ok(report)) => {
            info!(
                "Update complete: {} files seen, {} compressed, {} skipped across {} projects",
                report.files(),
                report.compressed,
                report.skipped,
                report.projects
            );
            Ok(())
        }
        TriggerOutcome::Completed(Err(e)) => {
            error!("{}", e.user_message());
            Err(e).context("Update failed")
        }
        TriggerOutcome::Rejected { wait_secs } => {
            anyhow::bail!("Update throttled, retry in {}s", wait_secs)
        }
    }
}
