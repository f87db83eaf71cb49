//! Command-line interface configuration.

use argh::FromArgs;
use std::{net::SocketAddr, time::Duration};

use crate::{config::LoggerConfig, telemetry::LogFormat};

/// Demo server for the reqlog request logging middleware
#[derive(Debug, FromArgs)]
pub struct Cli {
    /// server bind address (default: '127.0.0.1:8000')
    #[argh(option, default = "\"127.0.0.1:8000\".parse().unwrap()")]
    pub bind: SocketAddr,

    /// how often buffered log output is flushed, in milliseconds (default: 3000)
    #[argh(option, long = "flush-interval-ms", default = "3000")]
    pub flush_interval_ms: u64,

    /// write log lines as JSON
    #[argh(switch)]
    pub json: bool,

    /// log filter directives, RUST_LOG takes precedence (default: 'info')
    #[argh(option, long = "log-filter", default = "String::from(\"info\")")]
    pub log_filter: String,

    /// request path never written to the access log (repeatable)
    #[argh(option, long = "skip-path")]
    pub skip_path: Vec<String>,
}

impl Cli {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn log_format(&self) -> LogFormat {
        if self.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn logger_config(&self) -> LoggerConfig {
        self.skip_path
            .iter()
            .fold(LoggerConfig::default(), |config, path| config.skip_path(path.as_str()))
    }
}
