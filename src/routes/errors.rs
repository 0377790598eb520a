use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use crate::models::ErrorResponse;
use crate::services::ModelClientError;

/// Every failure a handler can return. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("No audio data received")]
    NoAudio,

    #[error("Audio payload exceeds {limit} bytes")]
    AudioTooLarge { limit: usize },

    #[error("Invalid multipart payload: {0}")]
    InvalidUpload(String),

    #[error("Error processing text: {0}")]
    TextProcessing(#[source] ModelClientError),

    #[error("Error processing audio: {0}")]
    AudioProcessing(#[source] ModelClientError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoAudio | ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::AudioTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TextProcessing(_) | ApiError::AudioProcessing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}
