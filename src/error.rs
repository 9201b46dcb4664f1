//! Crate-level error types.
//!
//! [`ForesightError`] unifies every failure source (configuration, HTTP
//! transport, JSON decoding, payload shape) behind a single enum so callers
//! can match on the variant they care about while still using the `?`
//! operator for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ForesightError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum ForesightError {
    /// An environment variable held a value that could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// An HTTP request failed to complete or returned a non-success status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body was not valid JSON for the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A response decoded but its contents broke a data invariant.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Coarse failure class surfaced to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport error, timeout, or non-success status.
    Network,
    /// Payload could not be decoded into candles, prices, or predictions.
    Parse,
    /// Invalid local configuration.
    Config,
}

impl ForesightError {
    /// Classifies the error into a [`FailureKind`].
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) => FailureKind::Config,
            Self::Http(e) if e.is_decode() => FailureKind::Parse,
            Self::Http(_) => FailureKind::Network,
            Self::Json(_) | Self::MalformedPayload(_) => FailureKind::Parse,
        }
    }
}
