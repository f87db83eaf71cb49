//! Request logger configuration.

use axum::http::HeaderName;

/// Settings for [`crate::middleware::log_requests_with`].
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Message attached to every access log event
    pub message: String,
    /// Exact request paths that are never logged (e.g. health checks)
    pub skip_paths: Vec<String>,
    /// Headers consulted, in order, for the client address
    pub client_ip_headers: Vec<HeaderName>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            message: String::from("[HTTP]"),
            skip_paths: Vec::new(),
            client_ip_headers: vec![
                HeaderName::from_static("x-forwarded-for"),
                HeaderName::from_static("x-real-ip"),
            ],
        }
    }
}

impl LoggerConfig {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    pub fn with_client_ip_headers(mut self, headers: Vec<HeaderName>) -> Self {
        self.client_ip_headers = headers;
        self
    }

    pub fn skips(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|p| p == path)
    }
}
