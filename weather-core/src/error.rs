use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable failure category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidCoordinates,
    InvalidDateFormat,
    InvalidDays,
    InvalidUnits,
    ValidationError,
    LocationNotFound,
    UpstreamUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCoordinates => "InvalidCoordinates",
            ErrorKind::InvalidDateFormat => "InvalidDateFormat",
            ErrorKind::InvalidDays => "InvalidDays",
            ErrorKind::InvalidUnits => "InvalidUnits",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::LocationNotFound => "LocationNotFound",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
        }
    }

    /// Validation failures are detected before any network call.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ErrorKind::LocationNotFound | ErrorKind::UpstreamUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a weather request.
///
/// Messages are safe to show to the caller: upstream response bodies are
/// logged at the provider boundary and never copied in here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("{0}")]
    InvalidCoordinates(String),

    #[error("{0}")]
    InvalidDateFormat(String),

    #[error("{0}")]
    InvalidDays(String),

    #[error("{0}")]
    InvalidUnits(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    LocationNotFound(String),

    #[error("{0}")]
    UpstreamUnavailable(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::InvalidCoordinates(_) => ErrorKind::InvalidCoordinates,
            WeatherError::InvalidDateFormat(_) => ErrorKind::InvalidDateFormat,
            WeatherError::InvalidDays(_) => ErrorKind::InvalidDays,
            WeatherError::InvalidUnits(_) => ErrorKind::InvalidUnits,
            WeatherError::ValidationError(_) => ErrorKind::ValidationError,
            WeatherError::LocationNotFound(_) => ErrorKind::LocationNotFound,
            WeatherError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    pub fn location_not_found(what: &str, query: &str) -> Self {
        WeatherError::LocationNotFound(format!(
            "Location not found. Please check the {what}: '{query}'."
        ))
    }

    /// Collapse a provider failure into `UpstreamUnavailable`.
    ///
    /// The full error chain goes to the log; the caller only sees which
    /// service failed.
    pub fn upstream(service: &str, err: anyhow::Error) -> Self {
        tracing::warn!(service, error = %format!("{err:#}"), "upstream request failed");
        WeatherError::UpstreamUnavailable(format!(
            "Unable to reach the {service} service. Please try again later."
        ))
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse { error_kind: self.kind(), message: self.to_string() }
    }
}

/// Serializable failure body: `{"errorKind": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: ErrorKind,
    pub message: String,
}
