use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::config::get_config;

/// Rejects any request whose `x-api-key` header does not match the
/// configured key. The comparison is constant-time.
pub async fn require_api_key(req: Request, next: Next) -> Response {
    let Some(key_header) = req.headers().get("x-api-key") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_api_key"})),
        )
            .into_response();
    };
    let Ok(provided) = key_header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_api_key_header"})),
        )
            .into_response();
    };

    let expected = &get_config().api_key;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_api_key"})),
        )
            .into_response()
    }
}
