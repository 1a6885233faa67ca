pub mod client;
pub mod service;
pub mod types;

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Weather API error: {status_text}")]
    Upstream { status: u16, status_text: String },
    #[error("Weather data not available for city: {0}")]
    DataUnavailable(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}
