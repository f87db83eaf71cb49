//! Crate-level error type.

use std::io;

/// Errors raised while wiring up logging or serving requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("flush interval must be greater than zero")]
    InvalidInterval,

    #[error("no tokio runtime is running")]
    NoRuntime,

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
