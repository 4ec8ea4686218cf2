use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bandstand_core::AppError;

use crate::error::ErrorResponse;
use crate::state::AppState;

/// Renders error bodies in the language negotiated from `Accept-Language`.
pub async fn localize_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let language = state.localization.negotiate(
        request
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
    );

    let mut response = next.run(request).await;
    let Some(error) = response.extensions_mut().remove::<AppError>() else {
        return response;
    };

    let body = ErrorResponse::render(&error, &state.localization, &language);
    let mut localized = (response.status(), Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&language) {
        localized
            .headers_mut()
            .insert(header::CONTENT_LANGUAGE, value);
    }

    localized
}
