//! HTTP error mapping. Every failure leaves the server as a JSON envelope
//! tagged `fail` (4xx) or `error` (5xx).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::cache::CacheError;
use crate::utils::{Envelope, ValidationError};
use crate::weather::WeatherError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("Weather API error: {status_text}")]
    Upstream { status: u16, status_text: String },
    #[error("{0}")]
    DataUnavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::DataUnavailable(_) => StatusCode::NOT_FOUND,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Upstream { status, status_text } => Self::Upstream { status, status_text },
            WeatherError::DataUnavailable(_) => Self::DataUnavailable(err.to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let envelope = match &self {
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                let envelope = Envelope::error("Internal Server Error");
                if cfg!(debug_assertions) {
                    envelope.with_stack(format!("{err:?}"))
                } else {
                    envelope
                }
            }
            other => Envelope::fail(other.to_string()),
        };

        (status, Json(envelope)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
