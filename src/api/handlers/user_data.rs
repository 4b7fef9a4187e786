use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use super::server_error;
use crate::registry::Waitlist;

/// Aggregate payload: total members and the email -> referral-count map.
#[derive(ToSchema, Serialize, Debug)]
pub struct UserDataResponse {
    #[serde(rename = "totalUsers")]
    total_users: u64,
    referrals: BTreeMap<String, u32>,
}

#[utoipa::path(
    post,
    path = "/api/user-data",
    responses(
        (status = 200, description = "Totals and referral counts", body = UserDataResponse),
        (status = 500, description = "Storage failure"),
    ),
    tag = "waitlist"
)]
/// Wait-list totals for the public counter widget.
#[instrument(skip(waitlist))]
pub async fn user_data(waitlist: Extension<Arc<Waitlist>>) -> impl IntoResponse {
    match waitlist.referral_snapshot() {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(UserDataResponse {
                total_users: snapshot.total_users,
                referrals: snapshot.referrals,
            }),
        )
            .into_response(),
        Err(err) => server_error("user-data failed", &err).into_response(),
    }
}
