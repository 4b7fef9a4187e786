use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use super::{message, server_error};
use crate::registry::{RegistryError, Waitlist, WalletUpdate};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubmitWalletRequest {
    email: Option<String>,
    #[serde(rename = "solanaWallet")]
    solana_wallet: Option<String>,
    #[serde(rename = "tonWallet")]
    ton_wallet: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/submit-wallet",
    request_body = SubmitWalletRequest,
    responses(
        (status = 200, description = "Wallet addresses stored"),
        (status = 400, description = "Missing payload or email"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Storage failure or corrupted record"),
    ),
    tag = "waitlist"
)]
/// Attach wallet addresses to a registered member.
#[instrument(skip(waitlist, payload))]
pub async fn submit_wallet(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<SubmitWalletRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let Some(email) = request.email else {
        return (StatusCode::BAD_REQUEST, message("Email is required"));
    };

    match waitlist.submit_wallet(
        &email,
        request.solana_wallet.as_deref(),
        request.ton_wallet.as_deref(),
    ) {
        Ok(WalletUpdate::Updated) => (
            StatusCode::OK,
            message("Wallet addresses submitted successfully"),
        ),
        Ok(WalletUpdate::UserNotFound) => (StatusCode::NOT_FOUND, message("User not found")),
        Err(err @ RegistryError::CorruptRecord { .. }) => {
            tracing::error!("submit-wallet failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                message("Corrupted user data"),
            )
        }
        Err(err) => server_error("submit-wallet failed", &err),
    }
}
