use crate::application::errors::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("city must not be empty")]
    MissingCity,
    #[error("date is required, expected YYYY-MM-DD")]
    MissingDate,
    #[error("weather store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidDate(_) | ApiError::MissingCity | ApiError::MissingDate => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                tracing::error!("Read request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, axum::Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
