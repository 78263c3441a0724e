use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Log level enum (replaces stringly-typed field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Diagnostics output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to bind; all interfaces by default.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Long-term host identity key. Generated (Ed25519) on first start if missing.
    #[serde(default = "default_host_key_path")]
    pub host_key_path: PathBuf,
    /// Identification string sent before key exchange.
    #[serde(default = "default_server_id")]
    pub server_id: String,
    /// Pending-connection queue length passed to listen(2).
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    /// Maximum concurrent sessions (0 = unlimited).
    #[serde(default)]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            host_key_path: default_host_key_path(),
            server_id: default_server_id(),
            backlog: default_backlog(),
            max_sessions: 0,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    2222
}

fn default_host_key_path() -> PathBuf {
    PathBuf::from("server.key")
}

fn default_server_id() -> String {
    "SSH-2.0-OpenSSH_8.2p1 Ubuntu-4ubuntu0.1".to_string()
}

fn default_backlog() -> u32 {
    100
}

/// Per-session wait bounds, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_channel_accept_secs")]
    pub channel_accept_secs: u64,
    #[serde(default = "default_shell_request_secs")]
    pub shell_request_secs: u64,
    #[serde(default = "default_receive_secs")]
    pub receive_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            channel_accept_secs: default_channel_accept_secs(),
            shell_request_secs: default_shell_request_secs(),
            receive_secs: default_receive_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn channel_accept(&self) -> Duration {
        Duration::from_secs(self.channel_accept_secs)
    }

    pub fn shell_request(&self) -> Duration {
        Duration::from_secs(self.shell_request_secs)
    }

    pub fn receive(&self) -> Duration {
        Duration::from_secs(self.receive_secs)
    }
}

fn default_channel_accept_secs() -> u64 {
    30
}

fn default_shell_request_secs() -> u64 {
    10
}

fn default_receive_secs() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Sent once before the first prompt. Empty disables it.
    #[serde(default = "default_welcome")]
    pub welcome: String,
    /// Canned answer for `ls`
    #[serde(default = "default_listing")]
    pub listing: String,
    /// Canned answer for `pwd`
    #[serde(default = "default_working_directory")]
    pub working_directory: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            welcome: default_welcome(),
            listing: default_listing(),
            working_directory: default_working_directory(),
        }
    }
}

fn default_prompt() -> String {
    "$ ".to_string()
}

fn default_welcome() -> String {
    "Welcome to Ubuntu 18.04.4 LTS (GNU/Linux 4.15.0-128-generic x86_64)\r\n\r\n".to_string()
}

fn default_listing() -> String {
    "users.txt".to_string()
}

fn default_working_directory() -> String {
    "/home/root".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Telemetry file, truncated at every start.
    #[serde(default = "default_telemetry_log_path")]
    pub telemetry_log_path: PathBuf,
    /// Record offered passwords in password auth events
    #[serde(default = "default_true")]
    pub log_passwords: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            telemetry_log_path: default_telemetry_log_path(),
            log_passwords: true,
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_telemetry_log_path() -> PathBuf {
    PathBuf::from("ssh_honeypot.log")
}

fn default_true() -> bool {
    true
}
