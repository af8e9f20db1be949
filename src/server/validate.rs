//! Argument validation helpers for service handlers
//!
//! Failures are client-reportable: they reach the caller and stay out of the
//! server log.

use crate::error::PostError;
use crate::protocol::Value;

/// Fail with `message` unless `condition` holds
pub fn check(condition: bool, message: impl Into<String>) -> Result<(), PostError> {
    if condition {
        Ok(())
    } else {
        Err(PostError::reportable(message))
    }
}

/// Unwrap `value`, failing with `message` when it is absent
pub fn check_some<T>(value: Option<T>, message: impl Into<String>) -> Result<T, PostError> {
    value.ok_or_else(|| PostError::reportable(message))
}

/// The argument at `index`
pub fn arg(args: &[Value], index: usize) -> Result<&Value, PostError> {
    args.get(index).ok_or_else(|| {
        PostError::reportable(format!(
            "Missing argument {} (got {})",
            index,
            args.len()
        ))
    })
}
