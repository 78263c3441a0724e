pub mod connection;
pub mod handler;
pub mod keys;
pub mod pubkey;
pub mod session;

use std::time::Duration;

use russh::keys::PrivateKey;

use crate::config::types::AppConfig;

/// Transport configuration shared by every session: host key, banner, auth methods.
pub fn build_server_config(config: &AppConfig, host_key: PrivateKey) -> russh::server::Config {
    let mut ssh_config = russh::server::Config::default();
    ssh_config.keys.push(host_key);
    ssh_config.server_id = russh::SshId::Standard(config.server.server_id.clone());
    ssh_config.methods = handler::allowed_methods();
    ssh_config.auth_rejection_time = Duration::from_secs(1);
    ssh_config.auth_rejection_time_initial = Some(Duration::from_secs(0));
    ssh_config
}
