//! Password reset endpoints: request a code, check it, set the new
//! password.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{message, server_error};
use crate::registry::{RegistryError, ResetCodeCheck, ResetCompletion, ResetRequest, Waitlist};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendResetCodeRequest {
    email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyResetCodeRequest {
    email: Option<String>,
    code: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    email: Option<String>,
    #[serde(rename = "newPassword")]
    new_password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/send-reset-code",
    request_body = SendResetCodeRequest,
    responses(
        (status = 200, description = "Code sent, or user not found"),
        (status = 400, description = "Missing payload or email"),
        (status = 500, description = "Delivery or storage failure"),
    ),
    tag = "waitlist"
)]
/// Issue a password-reset code to a registered email.
#[instrument(skip(waitlist, payload))]
pub async fn send_reset_code(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<SendResetCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let Some(email) = request.email else {
        return (StatusCode::BAD_REQUEST, message("Email is required"));
    };

    match waitlist.request_password_reset(&email).await {
        Ok(ResetRequest::CodeSent) => (StatusCode::OK, message("Reset code sent to your email.")),
        Ok(ResetRequest::UserNotFound) => (StatusCode::OK, message("User not found")),
        Err(RegistryError::Delivery(err)) => {
            error!("Final email sending error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                message(format!("Failed to send reset code: {err}")),
            )
        }
        Err(err) => server_error("send-reset-code failed", &err),
    }
}

#[utoipa::path(
    post,
    path = "/api/verify-reset-code",
    request_body = VerifyResetCodeRequest,
    responses(
        (status = 200, description = "Code verified, or invalid code"),
        (status = 400, description = "Missing payload"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "waitlist"
)]
/// Check a reset code without consuming it.
#[instrument(skip(waitlist, payload))]
pub async fn verify_reset_code(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<VerifyResetCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let (Some(email), Some(code)) = (request.email, request.code) else {
        return (StatusCode::OK, message("Invalid or expired reset code"));
    };

    match waitlist.confirm_password_reset(&email, &code) {
        Ok(ResetCodeCheck::Valid) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Reset code verified" })),
        ),
        Ok(ResetCodeCheck::InvalidOrExpiredCode) => {
            (StatusCode::OK, message("Invalid or expired reset code"))
        }
        Err(err) => server_error("verify-reset-code failed", &err),
    }
}

#[utoipa::path(
    post,
    path = "/api/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed, or user not found"),
        (status = 400, description = "Missing payload or fields"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "waitlist"
)]
/// Overwrite the stored password hash and consume the reset record.
#[instrument(skip(waitlist, payload))]
pub async fn reset_password(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let (Some(email), Some(new_password)) = (request.email, request.new_password) else {
        return (
            StatusCode::BAD_REQUEST,
            message("Email and new password are required"),
        );
    };

    match waitlist.complete_password_reset(&email, &SecretString::from(new_password)) {
        Ok(ResetCompletion::PasswordChanged) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Password reset successfully" })),
        ),
        Ok(ResetCompletion::UserNotFound) => (StatusCode::OK, message("User not found")),
        Err(err) => server_error("reset-password failed", &err),
    }
}
