use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bandstand_application::LocalizationService;
use bandstand_core::{AppError, Message, MessageKey};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;
use ts_rs::TS;

/// API error payload.
///
/// Besides `error` and `messages`, rejections add one `invalidX` field and
/// named attachments such as `expected`, `provided` or the resolved entity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
    #[serde(flatten)]
    #[ts(skip)]
    details: Map<String, Value>,
}

impl ErrorResponse {
    /// Renders an application error in one language.
    pub fn render(error: &AppError, localization: &LocalizationService, language: &str) -> Self {
        let Some(rejection) = error.rejection() else {
            return Self {
                error: localization.translate(language, &Message::new(MessageKey::InternalError)),
                messages: Vec::new(),
                details: Map::new(),
            };
        };

        let mut details = Map::new();
        if let Some((kind, values)) = rejection.invalid() {
            details.insert(kind.response_field().to_owned(), values.clone());
        }
        for (name, value) in rejection.attachments() {
            details.insert(name.clone(), value.clone());
        }

        Self {
            error: localization.translate(language, rejection.error()),
            messages: rejection
                .messages()
                .iter()
                .map(|message| localization.translate(language, message))
                .collect(),
            details,
        }
    }
}

/// HTTP API error wrapper around core application errors.
///
/// The response carries the status only; the localization middleware renders
/// the body from the error stored in the response extensions.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(ref detail) => {
                error!(%detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = status.into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
