//! Connectivity and health endpoints.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// GET /v2/
///
/// A controller refuses unauthenticated access to the API root.
pub async fn api_root() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "detail": "Authentication credentials were not provided."
        })),
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
