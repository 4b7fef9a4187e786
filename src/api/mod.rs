//! HTTP surface: the original wait-list endpoints on axum.

pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Extension, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa::OpenApi;

use crate::registry::Waitlist;

#[derive(OpenApi)]
#[openapi(
    info(title = "waitlist", description = "Wait-list registration service"),
    paths(
        handlers::health::health,
        handlers::send_code::send_code,
        handlers::verify_code::verify_code,
        handlers::submit_wallet::submit_wallet,
        handlers::user_data::user_data,
        handlers::login::login,
        handlers::reset::send_reset_code,
        handlers::reset::verify_reset_code,
        handlers::reset::reset_password,
    )
)]
struct ApiDoc;

/// Generated OpenAPI document for the routes below.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router around a shared registry handle.
#[must_use]
pub fn router(waitlist: Arc<Waitlist>) -> Router {
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        // allow requests from any origin
        .allow_origin(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/send-code", post(handlers::send_code::send_code))
        .route("/api/verify-code", post(handlers::verify_code::verify_code))
        .route(
            "/api/submit-wallet",
            post(handlers::submit_wallet::submit_wallet),
        )
        .route("/api/user-data", post(handlers::user_data::user_data))
        .route("/api/login", post(handlers::login::login))
        .route(
            "/api/send-reset-code",
            post(handlers::reset::send_reset_code),
        )
        .route(
            "/api/verify-reset-code",
            post(handlers::reset::verify_reset_code),
        )
        .route("/api/reset-password", post(handlers::reset::reset_password))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(waitlist)),
        )
}

/// Bind and serve until interrupted.
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, waitlist: Arc<Waitlist>) -> Result<()> {
    let app = router(waitlist);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, ?headers, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_route() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        for route in [
            "/health",
            "/api/send-code",
            "/api/verify-code",
            "/api/submit-wallet",
            "/api/user-data",
            "/api/login",
            "/api/send-reset-code",
            "/api/verify-reset-code",
            "/api/reset-password",
        ] {
            assert!(paths.contains_key(route), "missing: {route}");
        }
    }
}
