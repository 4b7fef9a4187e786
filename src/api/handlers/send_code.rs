use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{message, server_error};
use crate::registry::{Registration, RegistryError, Waitlist};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendCodeRequest {
    email: Option<String>,
    password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent, or a benign reason why not"),
        (status = 400, description = "Missing payload"),
        (status = 500, description = "Delivery or storage failure"),
    ),
    tag = "waitlist"
)]
/// Start a registration: persist a pending code and email it.
#[instrument(skip(waitlist, payload))]
pub async fn send_code(
    waitlist: Extension<Arc<Waitlist>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, message("Missing payload"));
    };
    let Some(email) = request.email else {
        return (StatusCode::OK, message("Invalid email address"));
    };
    let Some(password) = request.password else {
        return (StatusCode::BAD_REQUEST, message("Missing password"));
    };

    match waitlist
        .request_verification(&email, &SecretString::from(password))
        .await
    {
        Ok(Registration::CodeSent) => (
            StatusCode::OK,
            message("Verification code sent to your email."),
        ),
        Ok(Registration::InvalidEmail) => (StatusCode::OK, message("Invalid email address")),
        Ok(Registration::AlreadyRegistered) => {
            (StatusCode::OK, message("Email already registered"))
        }
        Err(RegistryError::Delivery(err)) => {
            error!("Final email sending error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                message(format!("Failed to send verification code: {err}")),
            )
        }
        Err(err) => server_error("send-code failed", &err),
    }
}
