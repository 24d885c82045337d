//! Error types for jsonapi-store operations.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for jsonapi-store operations.
pub type JsonApiResult<T> = Result<T, JsonApiError>;

/// Errors that can occur during jsonapi-store operations.
#[derive(Debug, Error)]
pub enum JsonApiError {
    /// Input was neither a parseable path string nor identifying metadata.
    #[error("invalid identifier: {input}")]
    InvalidIdentifier {
        /// The input that failed to resolve.
        input: String,
    },

    /// A JSON:API resource was missing a required member.
    #[error("malformed resource: {reason}")]
    MalformedResource {
        /// What was missing or wrong.
        reason: String,
    },

    /// An attribute name collides with the reserved metadata key.
    #[error("attribute {name:?} collides with the reserved metadata key")]
    ReservedAttribute {
        /// The offending attribute name.
        name: String,
    },

    /// A filter query string failed to parse.
    #[error("filter query error: {0}")]
    Filter(#[from] serde_json_path::ParseError),

    /// The transport reported a failure. The HTTP status, when known, is
    /// available via [`JsonApiError::status`].
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The hosting store could not apply a commit or serve a read.
    #[error("store error: {message}")]
    Store {
        /// Description of what went wrong.
        message: String,
    },
}

impl JsonApiError {
    /// Create an invalid identifier error.
    #[inline]
    pub fn invalid_identifier(input: impl Into<String>) -> Self {
        JsonApiError::InvalidIdentifier {
            input: input.into(),
        }
    }

    /// Create a malformed resource error.
    #[inline]
    pub fn malformed_resource(reason: impl Into<String>) -> Self {
        JsonApiError::MalformedResource {
            reason: reason.into(),
        }
    }

    /// Create a reserved attribute error.
    #[inline]
    pub fn reserved_attribute(name: impl Into<String>) -> Self {
        JsonApiError::ReservedAttribute { name: name.into() }
    }

    /// Create a store error.
    #[inline]
    pub fn store(message: impl Into<String>) -> Self {
        JsonApiError::Store {
            message: message.into(),
        }
    }

    /// HTTP status of the underlying transport failure, if any.
    ///
    /// This is the branching point for callers composing action chains:
    /// a failed request surfaces here as a plain value, never as a panic.
    pub fn status(&self) -> Option<u16> {
        match self {
            JsonApiError::Transport(err) => err.status(),
            _ => None,
        }
    }
}
