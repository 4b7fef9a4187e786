use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;

use super::{message, server_error};
use crate::registry::{Confirmation, Waitlist};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyCodeRequest {
    email: Option<String>,
    code: Option<String>,
    /// Referral token of the member who referred this registrant.
    /// Historical field name; it carries a referral code, not an email.
    #[serde(rename = "refEmail")]
    ref_email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Verified (position + referral link), or invalid code"),
        (status = 400, description = "Missing payload"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "waitlist"
)]
/// Confirm a pending registration and credit the referrer, if any.
#[instrument(skip(waitlist, payload))]
pub async fn verify_code(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<VerifyCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let (Some(email), Some(code)) = (request.email, request.code) else {
        return (
            StatusCode::OK,
            message("Invalid or expired verification code"),
        );
    };

    match waitlist
        .confirm_verification(&email, &code, request.ref_email.as_deref())
        .await
    {
        Ok(Confirmation::Verified(verified)) => (
            StatusCode::OK,
            Json(json!({
                "message": "Email verified successfully",
                "position": verified.position,
                "referralLink": verified.referral_link,
            })),
        ),
        Ok(Confirmation::InvalidOrExpiredCode) => (
            StatusCode::OK,
            message("Invalid or expired verification code"),
        ),
        Err(err) => server_error("verify-code failed", &err),
    }
}
