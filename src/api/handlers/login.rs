use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;

use super::{message, server_error};
use crate::registry::{Authentication, Waitlist};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Position, wallets and referral link, or a benign reason"),
        (status = 400, description = "Missing payload or fields"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "waitlist"
)]
/// Password check returning the member's wait-list view.
#[instrument(skip(waitlist, payload))]
pub async fn login(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return (
            StatusCode::BAD_REQUEST,
            message("Email and password are required"),
        );
    };

    match waitlist.authenticate(&email, &SecretString::from(password)) {
        Ok(Authentication::Authenticated(summary)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Login successful",
                "position": summary.position,
                "solanaWallet": summary.solana_wallet,
                "tonWallet": summary.ton_wallet,
                "referralLink": summary.referral_link,
            })),
        ),
        Ok(Authentication::UserNotFound) => (StatusCode::OK, message("User not found")),
        Ok(Authentication::InvalidCredentials) => (StatusCode::OK, message("Invalid password")),
        Err(err) => server_error("login failed", &err),
    }
}
