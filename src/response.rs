//! The JSON envelope wrapped around every successful response.

use axum::Json;
use serde::Serialize;

/// A successful response: `{"ok": true, "data": ...}`.
///
/// `data` is left out for actions that only need to be acknowledged.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wrap `data` in a successful response.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: true,
        data: Some(data),
    })
}

/// A successful response without any data.
pub fn acknowledged() -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        ok: true,
        data: None,
    })
}

/// The response type for handlers that return data or an error.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, crate::Error>;
