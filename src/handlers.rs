//! Demo HTTP handlers exercising each logging and reporting path.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::request_error::{Abort, ErrorType, RequestError, RequestErrors};

/// Routes served by the demo binary. Layers are added by the caller.
pub fn routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/widgets/{id}", get(get_widget))
        .route("/widgets", post(create_widget))
        .route("/fail", get(fail))
}

pub async fn index() -> &'static str {
    "reqlog demo"
}

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Only widget 1 exists; anything else is a public 404.
pub async fn get_widget(Path(id): Path<u32>) -> Result<Json<Value>, Abort> {
    if id == 1 {
        return Ok(Json(json!({ "id": 1, "name": "sprocket" })));
    }
    Err(Abort::new(StatusCode::NOT_FOUND).error(
        RequestError::new(format!("widget {id} not found"))
            .with_kind(ErrorType::PUBLIC)
            .with_meta(json!({ "id": id })),
    ))
}

/// Accepts a JSON object with a non-empty `name`.
pub async fn create_widget(errors: RequestErrors, Json(body): Json<Value>) -> Response {
    match body.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {
            (StatusCode::CREATED, Json(json!({ "id": 2, "name": name }))).into_response()
        }
        _ => {
            errors.push(
                RequestError::new("name is required")
                    .with_kind(ErrorType::BIND | ErrorType::PUBLIC)
                    .with_meta(json!({ "field": "name" })),
            );
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
    }
}

/// Always fails with a private server error.
pub async fn fail() -> Abort {
    Abort::with_error(StatusCode::INTERNAL_SERVER_ERROR, "simulated backend failure")
}
