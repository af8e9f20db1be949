//! Protocol Module
//!
//! Defines the wire protocol for calls posted over HTTP.
//!
//! ## Call Format
//! ```text
//! ┌──────────────┬────────────────┬────────────┬───────────┬──────────────┐
//! │ Version (s)  │ Auth code (s)? │ Service(4) │ Method(4) │  Args (...)  │
//! └──────────────┴────────────────┴────────────┴───────────┴──────────────┘
//! ```
//!
//! - `(s)`: nullable string, 1 presence byte + 2 byte length + UTF-8
//! - auth code is present only when the deployment enables it on both sides
//! - args: bincode-encoded array of [`Value`], nested at most
//!   [`MAX_VALUE_DEPTH`] lists/maps deep
//! - nothing may follow the args
//!
//! ## Response Format
//! A single bincode-encoded [`Outcome`]: either the method's return value
//! (`Value::Null` when there is none) or a [`StreamableError`].

mod value;
mod call;
mod outcome;
mod codec;

pub use value::{Value, MAX_VALUE_DEPTH};
pub use call::Call;
pub use outcome::{Outcome, StreamableError};
pub use codec::{
    WireReader, WireWriter,
    encode_call, decode_call,
    encode_outcome, decode_outcome,
    read_body, write_outcome,
    MAX_STRING_LEN,
};

/// Cause codes sent when things go wrong below the service layer
pub mod codes {
    /// Something broke while streaming the call
    pub const STREAMING_ERROR: &str = "e.streaming_error";

    /// Client and server disagree on the protocol version
    pub const VERSION_MISMATCH: &str = "e.version_mismatch";

    /// The service has no method with the requested id
    pub const METHOD_NOT_FOUND: &str = "e.method_not_found";
}
