use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use bandstand_core::AppError;
use tower_http::cors::CorsLayer;

use crate::handlers::TOTAL_COUNT_HEADER;

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT_LANGUAGE])
        .expose_headers([HeaderName::from_static(TOTAL_COUNT_HEADER)]))
}
