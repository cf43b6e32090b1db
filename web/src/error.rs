//! API error type
//!
//! API failures never surface as HTTP errors: every variant renders as
//! `200 {"status":"error","message":...}`.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither a command nor a tool was supplied
    #[error("No tool or command specified")]
    NothingToRun,
    #[error("{0}")]
    BadBody(#[from] BytesRejection),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.to_string(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_run_message() {
        assert_eq!(
            ApiError::NothingToRun.to_string(),
            "No tool or command specified"
        );
    }

    #[test]
    fn test_error_renders_ok_status() {
        let response = ApiError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
