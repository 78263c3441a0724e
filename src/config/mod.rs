pub mod types;

use anyhow::{Context, Result};
use std::path::Path;
use types::AppConfig;

/// Maximum config file size (1 MB)
const MAX_CONFIG_SIZE: u64 = 1_048_576;

/// Smallest listen(2) backlog we agree to run with.
pub const MIN_BACKLOG: u32 = 100;

/// Load and validate configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("reading config metadata: {}", path.display()))?;
    if metadata.len() > MAX_CONFIG_SIZE {
        anyhow::bail!(
            "config file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_CONFIG_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content).context("parsing TOML configuration")?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_server(config)?;
    validate_timeouts(config)?;
    validate_shell(config)?;
    Ok(())
}

fn validate_server(config: &AppConfig) -> Result<()> {
    if !config.server.server_id.starts_with("SSH-2.0-") {
        anyhow::bail!(
            "server.server_id must start with 'SSH-2.0-' (got '{}')",
            config.server.server_id
        );
    }
    if config.server.server_id.contains(['\r', '\n']) {
        anyhow::bail!("server.server_id must be a single line");
    }
    if config.server.backlog < MIN_BACKLOG {
        anyhow::bail!(
            "server.backlog must be >= {} (got {})",
            MIN_BACKLOG,
            config.server.backlog
        );
    }
    Ok(())
}

fn validate_timeouts(config: &AppConfig) -> Result<()> {
    let t = &config.timeouts;
    if t.channel_accept_secs == 0 {
        anyhow::bail!("timeouts.channel_accept_secs must be > 0");
    }
    if t.shell_request_secs == 0 {
        anyhow::bail!("timeouts.shell_request_secs must be > 0");
    }
    if t.receive_secs == 0 {
        anyhow::bail!("timeouts.receive_secs must be > 0");
    }
    Ok(())
}

fn validate_shell(config: &AppConfig) -> Result<()> {
    if config.shell.prompt.is_empty() {
        anyhow::bail!("shell.prompt must not be empty");
    }
    Ok(())
}
