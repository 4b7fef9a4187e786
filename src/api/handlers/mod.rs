//! Route handlers.
//!
//! Benign registry outcomes are reported as `200` with a descriptive
//! `message`, the way the original clients expect; only dependency
//! failures become `500`.

pub mod health;
pub mod login;
pub mod reset;
pub mod send_code;
pub mod submit_wallet;
pub mod user_data;
pub mod verify_code;

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::error;

use crate::registry::RegistryError;

pub fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}

/// Dependency failure: log the cause, answer with a generic 500.
pub fn server_error(context: &str, err: &RegistryError) -> (StatusCode, Json<Value>) {
    error!("{context}: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, message("Server error"))
}
