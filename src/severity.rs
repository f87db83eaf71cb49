//! Status-code to log-level classification.

use axum::http::StatusCode;
use tracing::Level;

/// Log level chosen for a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Client errors warn, server errors are errors, everything else is info.
    pub fn from_status(status: StatusCode) -> Self {
        Self::from_code(status.as_u16())
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            400..=499 => Severity::Warn,
            500.. => Severity::Error,
            _ => Severity::Info,
        }
    }

    pub fn level(self) -> Level {
        match self {
            Severity::Info => Level::INFO,
            Severity::Warn => Level::WARN,
            Severity::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_warn() {
        for code in 400..=499 {
            assert_eq!(Severity::from_code(code), Severity::Warn, "code {code}");
        }
    }

    #[test]
    fn test_server_errors_error() {
        for code in [500, 502, 503, 599, 600, 999] {
            assert_eq!(Severity::from_code(code), Severity::Error, "code {code}");
        }
    }

    #[test]
    fn test_everything_else_info() {
        for code in (100..400).chain([0, 1, 99]) {
            assert_eq!(Severity::from_code(code), Severity::Info, "code {code}");
        }
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(Severity::from_status(StatusCode::OK).level(), Level::INFO);
        assert_eq!(
            Severity::from_status(StatusCode::NOT_FOUND).level(),
            Level::WARN
        );
        assert_eq!(
            Severity::from_status(StatusCode::BAD_GATEWAY).level(),
            Level::ERROR
        );
    }
}
