use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::{AppError, ErrorKind};
use crate::DEFAULT_API_BASE_URL;

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

/// Where the backend lives. The base URL always ends with `/` so endpoint
/// paths can be appended without losing a path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: normalize_trailing_slash(DEFAULT_API_BASE_URL),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = base_url.as_ref().trim();
        let parsed = validate(raw)?;
        Ok(Self {
            base_url: normalize_trailing_slash(parsed.as_str()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `upload`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn validate(url: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: truncate_url(url),
        reason: reason.to_string(),
    };

    if url.is_empty() {
        return Err(invalid("URL cannot be empty"));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(invalid("URL is too long"));
    }

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(invalid(&format!(
            "invalid scheme '{scheme}', only 'http' and 'https' are allowed"
        )));
    }

    if parsed.host_str().is_none() {
        return Err(invalid("URL must have a host"));
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials in URL are not allowed"));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(parsed)
}

fn normalize_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn truncate_url(url: &str) -> String {
    match url.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}
