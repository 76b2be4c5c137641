//! HTTP-facing error type: wraps `txrag_core::Error` and renders it as the
//! `{ error_kind, message }` body spec §7 defines, with the matching status
//! code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ServerError(#[from] pub txrag_core::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        crate::telemetry::record_error(self.0.error_kind());
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error_kind": self.0.error_kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
