//! Error taxonomy for the places map.
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | `UpstreamError` | gateway | fetch fails, surfaces as a failed load with manual retry |
//! | `GatewayError` | gateway detail lookup | `NotFound` or wrapped `UpstreamError` |
//! | `NormalizationWarning` | normalizer | one record dropped, batch continues |
//! | `ValidationWarning` | normalizer | display field defaulted, record kept |
//! | `WidgetInitError` | map synchronizer | mount fails, no automatic retry |
//! | `ConfigError` | configuration loading | startup fails |
//!
//! `UpstreamError` is `Clone` because every waiter on a shared in-flight
//! fetch receives the same failure.

use serde::{Deserialize, Serialize};

/// Failure reaching the external GIS API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
    /// HTTP status when the upstream answered; `None` for transport failures
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    /// Upstream answered with a non-success status
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: format!("Upstream error {}", status),
        }
    }

    /// DNS, connect, timeout or undecodable body
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => UpstreamError::status(status.as_u16()),
            None => UpstreamError::transport(err.to_string()),
        }
    }
}

/// Single-place lookup failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Place {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// A malformed upstream record that was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("record #{index} dropped: {reason}")]
pub struct NormalizationWarning {
    /// Position in the upstream sequence
    pub index: usize,
    /// Record id when it could be read
    pub id: Option<i64>,
    pub reason: String,
}

/// A display field that was missing and got a default value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub id: i64,
    pub field: &'static str,
    pub default: &'static str,
}

/// The mapping widget could not be constructed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Map widget failed to initialize: {reason}")]
pub struct WidgetInitError {
    pub reason: String,
}

impl WidgetInitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid upstream URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_message() {
        let err = UpstreamError::status(503);
        assert_eq!(err.status, Some(503));
        assert_eq!(err.to_string(), "Upstream error 503");
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = UpstreamError::transport("connection refused");
        assert_eq!(err.status, None);
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_gateway_error_wraps_upstream() {
        let err: GatewayError = UpstreamError::status(500).into();
        assert_eq!(err.to_string(), "Upstream error 500");
        assert_eq!(GatewayError::NotFound(9).to_string(), "Place 9 not found");
    }
}
