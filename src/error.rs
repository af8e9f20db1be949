//! Error types for Riposte
//!
//! Two layers live here:
//! - [`RiposteError`]: infrastructure failures (I/O, codec, transport, config)
//! - [`PostError`]: the outcome of a failed service call, split into
//!   client-reportable and internal failures

use std::fmt;

use thiserror::Error;

use crate::protocol::codes;

/// Result type alias using RiposteError
pub type Result<T> = std::result::Result<T, RiposteError>;

/// Unified error type for Riposte infrastructure
#[derive(Debug, Error)]
pub enum RiposteError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    #[error("Service not registered: {0}")]
    ServiceUnavailable(&'static str),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for RiposteError {
    fn from(err: bincode::Error) -> Self {
        RiposteError::Codec(err.to_string())
    }
}

/// Failure of a single service call.
///
/// Every variant ends up on the wire as a `StreamableError` carrying
/// [`PostError::cause`]. Only internal failures are written to the server log.
#[derive(Debug, Error)]
pub enum PostError {
    /// Intended for the caller; never logged server-side.
    #[error("{0}")]
    Reportable(String),

    /// Anything else. Logged with method diagnostics, then still sent to the client.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PostError {
    /// Client-reportable failure with the given cause
    pub fn reportable(cause: impl Into<String>) -> Self {
        PostError::Reportable(cause.into())
    }

    /// Internal failure with a plain message
    pub fn internal(message: impl fmt::Display) -> Self {
        PostError::Internal {
            message: message.to_string(),
            source: None,
        }
    }

    /// Internal failure wrapping an underlying error; its message becomes the cause
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PostError::Internal {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn streaming() -> Self {
        PostError::reportable(codes::STREAMING_ERROR)
    }

    pub fn version_mismatch() -> Self {
        PostError::reportable(codes::VERSION_MISMATCH)
    }

    pub fn method_not_found() -> Self {
        PostError::reportable(codes::METHOD_NOT_FOUND)
    }

    /// Whether the server should log this failure
    pub fn is_loggable(&self) -> bool {
        matches!(self, PostError::Internal { .. })
    }

    /// Message delivered to the client
    pub fn cause(&self) -> &str {
        match self {
            PostError::Reportable(cause) => cause,
            PostError::Internal { message, .. } => message,
        }
    }
}

impl From<RiposteError> for PostError {
    fn from(err: RiposteError) -> Self {
        PostError::from_error(err)
    }
}
