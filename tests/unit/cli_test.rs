use clap::Parser;
use sshoney::cli::Cli;
use sshoney::config::types::AppConfig;

#[test]
fn no_arguments() {
    let cli = Cli::try_parse_from(["sshoney"]).unwrap();
    assert!(cli.port.is_none());
    assert!(cli.bind.is_none());
    assert!(cli.log_level.is_none());
    assert!(cli.telemetry_log.is_none());
}

#[test]
fn short_flags() {
    let cli = Cli::try_parse_from(["sshoney", "-p", "2200", "-b", "127.0.0.1"]).unwrap();
    assert_eq!(cli.port, Some(2200));
    assert_eq!(cli.bind.unwrap().to_string(), "127.0.0.1");
}

#[test]
fn long_flags() {
    let cli = Cli::try_parse_from([
        "sshoney",
        "--port",
        "22",
        "--bind",
        "::",
        "--config",
        "/etc/sshoney.toml",
        "--log-level",
        "debug",
        "--telemetry-log",
        "/tmp/events.log",
    ])
    .unwrap();
    assert_eq!(cli.port, Some(22));
    assert_eq!(cli.bind.unwrap().to_string(), "::");
    assert_eq!(cli.config.unwrap().to_str(), Some("/etc/sshoney.toml"));
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.telemetry_log.unwrap().to_str(), Some("/tmp/events.log"));
}

#[test]
fn invalid_port_rejected() {
    assert!(Cli::try_parse_from(["sshoney", "-p", "70000"]).is_err());
    assert!(Cli::try_parse_from(["sshoney", "-p", "ssh"]).is_err());
}

#[test]
fn invalid_bind_rejected() {
    assert!(Cli::try_parse_from(["sshoney", "-b", "localhost"]).is_err());
}

#[test]
fn overrides_apply_on_top_of_config() {
    let cli = Cli::try_parse_from([
        "sshoney",
        "-p",
        "2022",
        "--telemetry-log",
        "capture.log",
    ])
    .unwrap();
    let mut cfg = AppConfig::default();
    cfg.server.host_key_path = "custom.key".into();
    cli.apply(&mut cfg);

    assert_eq!(cfg.server.port, 2022);
    assert_eq!(cfg.server.bind.to_string(), "0.0.0.0");
    assert_eq!(cfg.logging.telemetry_log_path.to_str(), Some("capture.log"));
    assert_eq!(cfg.server.host_key_path.to_str(), Some("custom.key"));
}

#[test]
fn absent_flags_leave_config_alone() {
    let cli = Cli::try_parse_from(["sshoney"]).unwrap();
    let mut cfg = AppConfig::default();
    cfg.server.port = 4022;
    cli.apply(&mut cfg);
    assert_eq!(cfg.server.port, 4022);
}
