//! Outcome definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use super::Value;

/// An error that occurred on the server, as seen by the client.
///
/// Service code never builds one directly: any failed call is turned into
/// one by the request processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamableError {
    cause: String,
}

impl StreamableError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self { cause: cause.into() }
    }

    /// The failure cause; a cause code or the failing handler's message
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

/// The single value sent back for a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Result(Value),
    Error(StreamableError),
}

impl Outcome {
    /// Create a successful outcome
    pub fn ok(value: impl Into<Value>) -> Self {
        Outcome::Result(value.into())
    }

    /// Create an error outcome
    pub fn error(cause: impl Into<String>) -> Self {
        Outcome::Error(StreamableError::new(cause))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// Split into the returned value or the failure cause
    pub fn into_result(self) -> std::result::Result<Value, String> {
        match self {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(err) => Err(err.cause),
        }
    }
}
