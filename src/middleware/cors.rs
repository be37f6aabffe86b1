use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

/// Browser access for the candidate API: any origin, but only the methods
/// and headers the routes actually use.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-api-key")])
}
