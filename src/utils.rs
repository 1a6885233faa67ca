use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::cache::{TTL_KEY_MISSING, TTL_NO_EXPIRY};

/// Envelope status: `success` for 2xx, `fail` for client errors, `error` for server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
    Error,
}

/// JSON body shared by every API response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            message: None,
            stack: None,
        }
    }
}

impl Envelope<()> {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::failure(ResponseStatus::Fail, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::failure(ResponseStatus::Error, message.into())
    }

    pub fn with_stack(mut self, stack: String) -> Self {
        self.stack = Some(stack);
        self
    }

    fn failure(status: ResponseStatus, message: String) -> Self {
        Self {
            status,
            data: None,
            message: Some(message),
            stack: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cache key is required and must be a non-empty string")]
    MissingKey,
    #[error("TTL must be a number")]
    TtlNotNumber,
    #[error("TTL must be greater than 0")]
    TtlNotPositive,
    #[error("TTL must be a whole number of seconds")]
    TtlNotInteger,
    #[error("TTL must not exceed {} seconds", MAX_TTL_SECONDS)]
    TtlTooLarge,
    #[error("City is required")]
    MissingCity,
    #[error("Location is required")]
    MissingLocation,
}

/// Rejects empty or whitespace-only cache keys. The key itself is returned untouched.
pub fn require_key(key: &str) -> Result<&str, ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::MissingKey);
    }
    Ok(key)
}

/// Largest accepted TTL, 100 years. The store rejects expiries that overflow
/// its millisecond clock.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 3600;

/// Validates the `ttl` field of a request body as positive whole seconds.
pub fn parse_ttl(ttl: Option<&Value>) -> Result<u64, ValidationError> {
    let Some(Value::Number(n)) = ttl else {
        return Err(ValidationError::TtlNotNumber);
    };

    let secs = if let Some(secs) = n.as_u64() {
        secs
    } else if n.is_i64() {
        return Err(ValidationError::TtlNotPositive);
    } else {
        match n.as_f64() {
            Some(f) if f <= 0.0 => return Err(ValidationError::TtlNotPositive),
            Some(f) if f.fract() != 0.0 => return Err(ValidationError::TtlNotInteger),
            Some(f) if f > MAX_TTL_SECONDS as f64 => return Err(ValidationError::TtlTooLarge),
            Some(f) => f as u64,
            None => return Err(ValidationError::TtlNotInteger),
        }
    };

    match secs {
        0 => Err(ValidationError::TtlNotPositive),
        secs if secs > MAX_TTL_SECONDS => Err(ValidationError::TtlTooLarge),
        secs => Ok(secs),
    }
}

/// Treats empty, `undefined` and `null` path segments as absent.
pub fn normalize_param(param: Option<String>) -> Option<String> {
    param
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty() && p != "undefined" && p != "null")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TtlStatus {
    Active,
    Expired,
    NoExpiry,
    NotFound,
}

impl TtlStatus {
    pub fn from_ttl(ttl: i64) -> Self {
        match ttl {
            TTL_KEY_MISSING => Self::NotFound,
            TTL_NO_EXPIRY => Self::NoExpiry,
            1.. => Self::Active,
            // 0 and any other negative value: nothing left to live
            _ => Self::Expired,
        }
    }
}

/// `"{h}h {m}m {s}s"` for a positive TTL, `None` otherwise.
pub fn format_ttl(ttl: i64) -> Option<String> {
    (ttl > 0).then(|| format!("{}h {}m {}s", ttl / 3600, (ttl % 3600) / 60, ttl % 60))
}
