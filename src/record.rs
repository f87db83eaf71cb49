//! Per-request access log record.

use axum::{
    extract::{ConnectInfo, OriginalUri},
    http::{HeaderName, Request},
};
use std::{net::SocketAddr, time::Duration};

use crate::severity::Severity;

/// Everything logged about one completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub client_ip: String,
    pub status_code: u16,
    pub latency: Duration,
    pub error_text: String,
}

// tracing needs the level at compile time, so each severity gets its own callsite.
macro_rules! access_event {
    ($level:ident, $record:expr, $message:expr) => {{
        let record: &RequestRecord = $record;
        tracing::$level!(
            status_code = record.status_code,
            latency = ?record.latency,
            client_ip = %record.client_ip,
            method = %record.method,
            path = %record.path,
            error = %record.error_text,
            "{}",
            $message
        )
    }};
}

impl RequestRecord {
    pub fn severity(&self) -> Severity {
        Severity::from_code(self.status_code)
    }

    /// Emits the record as a single event at its severity.
    pub fn emit(&self, message: &str) {
        match self.severity() {
            Severity::Info => access_event!(info, self, message),
            Severity::Warn => access_event!(warn, self, message),
            Severity::Error => access_event!(error, self, message),
        }
    }
}

/// Path as received by the server, before any router nesting stripped it.
pub fn request_path<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path())
        .unwrap_or_else(|| req.uri().path())
        .to_string()
}

/// Best guess at the client address.
///
/// The first non-empty entry of the first listed header wins; otherwise the
/// peer address recorded by `into_make_service_with_connect_info`. Empty when
/// neither is available.
pub fn client_ip<B>(req: &Request<B>, headers: &[HeaderName]) -> String {
    let forwarded = headers.iter().find_map(|name| {
        let value = req.headers().get(name)?.to_str().ok()?;
        let first = value.split(',').next()?.trim();
        (!first.is_empty()).then(|| first.to_string())
    });

    forwarded
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default()
}
