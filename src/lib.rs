pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod server;
pub mod shell;
pub mod ssh;
pub mod telemetry;
pub mod utils;
