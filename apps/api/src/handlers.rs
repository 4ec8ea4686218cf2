pub mod albums;
pub mod bands;
pub mod health;
pub mod songs;

use axum::Json;
use axum::body::Bytes;
use axum::http::{Method, Uri};
use bandstand_application::Page;
use bandstand_core::{AppError, Message, MessageKey};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Response header carrying the collection size on list endpoints.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Query string pairs in request order, repeated names included.
pub type QueryPairs = Vec<(String, String)>;

/// Collection response with its total count header.
pub type Listing<T> = ([(&'static str, String); 1], Json<Vec<T>>);

pub async fn route_not_found_handler(method: Method, uri: Uri) -> ApiError {
    AppError::not_found(
        Message::new(MessageKey::RouteNotFound)
            .with("method", method)
            .with("path", uri.path()),
    )
    .into()
}

/// Parses a write body. An empty body reads as `{}`; anything else must be a
/// JSON object.
pub fn object_body(body: &Bytes) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(AppError::validation(Message::new(MessageKey::MalformedBody)).into()),
    }
}

pub fn listing<V, T: From<V>>(page: Page<V>) -> Listing<T> {
    (
        [(TOTAL_COUNT_HEADER, page.total.to_string())],
        Json(page.items.into_iter().map(T::from).collect()),
    )
}
