use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use sshoney::cli::Cli;
use sshoney::config::{self, types::AppConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut app_config);
    config::validate_config(&app_config)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| app_config.logging.level.to_string());
    sshoney::logging::setup_logging(&level, app_config.logging.format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %app_config.server.listen_addr(),
        telemetry_log = %app_config.logging.telemetry_log_path.display(),
        "Starting sshoney"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if let Err(e) = sshoney::server::run(app_config).await {
            error!(error = %format!("{:#}", e), "Server error");
            std::process::exit(1);
        }
    });

    Ok(())
}
