//! Health probe: store-aware status with a small JSON payload.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::registry::Waitlist;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store is reachable", body = Health),
        (status = 503, description = "Store probe failed", body = Health),
    ),
    tag = "health"
)]
/// Report service status based on one cheap store read.
pub async fn health(waitlist: Extension<Arc<Waitlist>>) -> impl IntoResponse {
    let store_status = match waitlist.probe() {
        Ok(()) => "ok",
        Err(err) => {
            error!("health probe failed: {err}");
            "error"
        }
    };

    let status = if store_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(Health {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: store_status.to_string(),
        }),
    )
}
