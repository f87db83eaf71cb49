//! Reqlog library - request logging and error reporting middleware for axum.

pub mod cli;
pub mod config;
pub mod error;
pub mod flusher;
pub mod handlers;
pub mod middleware;
pub mod record;
pub mod request_error;
pub mod severity;
pub mod sink;
pub mod telemetry;

pub use error::{Error, Result};
