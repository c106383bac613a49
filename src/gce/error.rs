//! Error types for the Google Compute Engine provider.

use thiserror::Error;

use crate::config::ConfigError;
use crate::provider::{ErrorKind, ProviderError};

/// Errors raised by the Google Compute Engine provider.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GceError {
    /// Raised when the provider is constructed with incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the service account token cannot be minted or exchanged.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the signing or token exchange failure.
        message: String,
    },
    /// Raised when the HTTP request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Endpoint being called.
        url: String,
        /// Error message from the HTTP client.
        message: String,
    },
    /// Raised when the Compute API answers with a non-success status.
    #[error("compute API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },
    /// Raised when a response body does not match the expected schema.
    #[error("failed to decode {resource}: {message}")]
    Decode {
        /// Resource being decoded (for example `instances`).
        resource: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when a named instance is missing from the project listing.
    #[error("instance {name} not found")]
    InstanceNotFound {
        /// Instance name that was looked up.
        name: String,
    },
    /// Raised when random placement finds no zone reporting `UP`.
    #[error("no zone with status UP is available for placement")]
    NoZonesAvailable,
    /// Raised when at least one create request of a batch failed.
    #[error("created {} of {requested} instances: {failure}", .created.len())]
    PartialCreate {
        /// Number of instances requested.
        requested: usize,
        /// Names of the instances the backend accepted; they are not rolled
        /// back.
        created: Vec<String>,
        /// First failure observed in the batch.
        failure: Box<GceError>,
    },
}

impl ProviderError for GceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::InstanceNotFound { .. } => ErrorKind::NotFound,
            Self::PartialCreate { failure, .. } => failure.kind(),
            Self::Auth { .. }
            | Self::Transport { .. }
            | Self::Api { .. }
            | Self::Decode { .. }
            | Self::NoZonesAvailable => ErrorKind::BackendUnavailable,
        }
    }
}

impl From<ConfigError> for GceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
