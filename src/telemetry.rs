//! Global tracing subscriber setup.

use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

use crate::{
    error::{Error, Result},
    sink::BufferedSink,
};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Builds the filter, letting a non-empty `RUST_LOG` override `directives`.
pub fn env_filter(directives: &str) -> Result<EnvFilter> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.trim().is_empty() => EnvFilter::try_new(from_env)?,
        _ => EnvFilter::try_new(directives)?,
    };
    Ok(filter)
}

/// Installs the global subscriber, writing through `sink`.
///
/// The sink buffers output; pair it with a [`crate::flusher::Flusher`].
pub fn init(format: LogFormat, directives: &str, sink: BufferedSink) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives)?)
        .with_writer(sink);

    let installed = match format {
        LogFormat::Text => builder.with_ansi(io::stdout().is_terminal()).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| Error::Subscriber(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_directives_rejected() {
        // Only meaningful when RUST_LOG does not override the directives.
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        assert!(matches!(
            env_filter("reqlog=notalevel"),
            Err(Error::Filter(_))
        ));
        assert!(env_filter("info,reqlog=debug").is_ok());
    }
}
