//! Error types for the discovery, enrichment and alert stages.
//!
//! None of these are fatal to the scheduler: each stage boundary logs the
//! error and degrades to an empty or neutral result.

use reqwest::StatusCode;

/// A source adapter could not produce identifiers.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}")]
    Status { status: StatusCode },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// One enrichment batch could not be fetched or decoded.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}")]
    Status { status: StatusCode },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The destination handle is missing or the transport does not know it.
    #[error("destination unresolved: {0}")]
    DestinationUnresolved(String),

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport rejected alert with status {status}")]
    Rejected { status: StatusCode },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ConfigError::invalid("BATCH_SIZE", "abc", "not a number");
        assert_eq!(
            err.to_string(),
            "invalid value \"abc\" for BATCH_SIZE: not a number"
        );

        let err = AlertError::DestinationUnresolved("no webhook configured".into());
        assert!(err.to_string().contains("no webhook configured"));

        let err = SourceError::Status { status: StatusCode::BAD_GATEWAY };
        assert_eq!(err.to_string(), "unexpected status 502 Bad Gateway");
    }
}
