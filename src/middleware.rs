//! Request logging and error reporting middleware.

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::{
    sync::{Arc, LazyLock},
    time::Instant,
};

use crate::{
    config::LoggerConfig,
    record::{RequestRecord, client_ip, request_path},
    request_error::{ErrorType, RequestErrors},
};

static DEFAULT_CONFIG: LazyLock<LoggerConfig> = LazyLock::new(LoggerConfig::default);

/// Middleware that logs every completed request with the default settings
///
/// Use with `axum::middleware::from_fn`. Each request produces one event
/// carrying status, latency, client address, method, path and the recorded
/// request errors; the level follows [`crate::severity::Severity`].
pub async fn log_requests(req: Request, next: Next) -> Response {
    log(&DEFAULT_CONFIG, req, next).await
}

/// Same as [`log_requests`] with explicit settings, for `from_fn_with_state`.
pub async fn log_requests_with(
    State(config): State<Arc<LoggerConfig>>,
    req: Request,
    next: Next,
) -> Response {
    log(&config, req, next).await
}

async fn log(config: &LoggerConfig, mut req: Request, next: Next) -> Response {
    let start = Instant::now();
    let errors = RequestErrors::install(&mut req);
    let method = req.method().to_string();
    let path = request_path(&req);
    let client_ip = client_ip(&req, &config.client_ip_headers);

    let mut response = next.run(req).await;
    errors.absorb(&mut response);

    if !config.skips(&path) {
        RequestRecord {
            method,
            path,
            client_ip,
            status_code: response.status().as_u16(),
            latency: start.elapsed(),
            error_text: errors.snapshot().to_string(),
        }
        .emit(&config.message);
    }

    response
}

/// Middleware that turns recorded errors of any type into a JSON body
///
/// Only applies when the handler left the body empty; the status is kept.
pub async fn report_errors(req: Request, next: Next) -> Response {
    report(ErrorType::ANY, req, next).await
}

/// Same as [`report_errors`] but only for errors matching the given type.
pub async fn report_errors_by_type(
    State(filter): State<ErrorType>,
    req: Request,
    next: Next,
) -> Response {
    report(filter, req, next).await
}

async fn report(filter: ErrorType, mut req: Request, next: Next) -> Response {
    let errors = RequestErrors::install(&mut req);

    let mut response = next.run(req).await;
    errors.absorb(&mut response);

    if is_written(&response) {
        return response;
    }
    let Some(json) = errors.snapshot().by_type(filter).to_json() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(json.to_string()))
}

/// A body counts as written unless it is known to be empty.
fn is_written(response: &Response) -> bool {
    response.body().size_hint().exact() != Some(0)
}
