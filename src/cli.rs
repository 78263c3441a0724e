use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::types::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "sshoney", version, about = "Run an SSH honeypot server")]
pub struct Cli {
    /// The port to bind the ssh server to (default 2222)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The address to bind the ssh server to (default: all interfaces)
    #[arg(short, long)]
    pub bind: Option<IpAddr>,

    /// Optional TOML configuration file (also settable via SSHONEY_CONFIG env var)
    #[arg(short, long, env = "SSHONEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Diagnostics log level override (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Telemetry log file override
    #[arg(long)]
    pub telemetry_log: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(ref path) = self.telemetry_log {
            config.logging.telemetry_log_path = path.clone();
        }
    }
}
