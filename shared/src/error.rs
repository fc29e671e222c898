use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Server,
    Client,
    Validation,
    NotFound,
    RateLimited,
    Storage,
    Serialization,
    Deserialization,
    ImageProcessing,
    ImageTooLarge,
    ImageFormatUnsupported,
    Configuration,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Server => "SERVER_ERROR",
            Self::Client => "CLIENT_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::ImageProcessing => "IMAGE_PROCESSING_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            401..=499 => ErrorKind::Client,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(ApiErrorResponse::into_message)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }

    /// Maps a failed `crux_http` exchange onto the crate taxonomy.
    #[must_use]
    pub fn from_http_error(error: &crux_http::Error) -> Self {
        match error {
            crux_http::Error::Http(http) => {
                Self::from_http_status(u16::from(http.code), http.body.as_deref())
                    .with_internal(http.message.clone())
            }
            crux_http::Error::Json(reason) => {
                Self::new(ErrorKind::Deserialization, "Malformed response body")
                    .with_internal(reason.clone())
            }
            crux_http::Error::Url(reason) => {
                Self::new(ErrorKind::Configuration, "Invalid request URL")
                    .with_internal(reason.clone())
            }
            crux_http::Error::Io(reason) => {
                Self::new(ErrorKind::Network, "Request did not complete")
                    .with_internal(reason.clone())
            }
            crux_http::Error::Timeout => Self::new(ErrorKind::Timeout, "Request timed out"),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Error body returned by the backend. FastAPI-style services answer with
/// `detail`, others with `message`.
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ApiErrorResponse {
    fn into_message(self) -> Option<String> {
        match (self.message, self.detail) {
            (Some(message), _) if !message.is_empty() => Some(message),
            (_, Some(serde_json::Value::String(detail))) => Some(detail),
            (_, Some(detail)) if !detail.is_null() => Some(detail.to_string()),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_maps_ranges() {
        assert_eq!(AppError::from_http_status(400, None).kind, ErrorKind::Validation);
        assert_eq!(AppError::from_http_status(403, None).kind, ErrorKind::Client);
        assert_eq!(AppError::from_http_status(429, None).kind, ErrorKind::RateLimited);
        assert_eq!(AppError::from_http_status(503, None).kind, ErrorKind::Server);
        assert_eq!(AppError::from_http_status(302, None).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_from_http_status_reads_detail() {
        let body = br#"{"detail": "file missing"}"#;
        let err = AppError::from_http_status(422, Some(body));
        assert_eq!(err.message, "file missing");
        assert_eq!(err.context.get("http_status").map(String::as_str), Some("422"));
    }

    #[test]
    fn test_from_http_status_falls_back_on_garbage_body() {
        let err = AppError::from_http_status(500, Some(b"<html>oops</html>"));
        assert_eq!(err.message, "HTTP error: 500");
    }

    #[test]
    fn test_from_http_error_variants() {
        let err = AppError::from_http_error(&crux_http::Error::Timeout);
        assert_eq!(err.kind, ErrorKind::Timeout);

        let err = AppError::from_http_error(&crux_http::Error::Io("reset".into()));
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.internal_message.as_deref(), Some("reset"));

        let err = AppError::from_http_error(&crux_http::Error::Json("eof".into()));
        assert_eq!(err.kind, ErrorKind::Deserialization);
    }

    #[test]
    fn test_display_includes_code_and_internal() {
        let err = AppError::new(ErrorKind::Storage, "write failed").with_internal("disk full");
        assert_eq!(err.to_string(), "[STORAGE_ERROR] write failed (internal: disk full)");
    }
}
