use std::sync::Arc;

use russh::keys::PrivateKey;

use crate::config::types::AppConfig;
use crate::shell::interpreter::CommandInterpreter;
use crate::ssh;
use crate::telemetry::TelemetryLogger;

/// Process-wide state handed to every session worker.
///
/// The telemetry logger is the only piece sessions share at runtime.
pub struct HoneypotContext {
    pub config: Arc<AppConfig>,
    pub ssh_config: Arc<russh::server::Config>,
    pub telemetry: Arc<TelemetryLogger>,
    pub interpreter: Arc<CommandInterpreter>,
}

impl HoneypotContext {
    pub fn new(config: AppConfig, host_key: PrivateKey, telemetry: Arc<TelemetryLogger>) -> Self {
        let ssh_config = Arc::new(ssh::build_server_config(&config, host_key));
        let interpreter = Arc::new(CommandInterpreter::new(&config.shell, telemetry.clone()));
        Self {
            config: Arc::new(config),
            ssh_config,
            telemetry,
            interpreter,
        }
    }
}
