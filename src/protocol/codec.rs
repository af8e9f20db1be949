//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Primitive Encodings
//! ```text
//! i32:    ┌──────────────────┐
//!         │ big-endian (4)   │
//!         └──────────────────┘
//! string: ┌──────────┬──────────┬──────────────┐
//!         │ Flag (1) │ Len (2)  │    UTF-8     │   flag 0 = null, no len/data
//!         └──────────┴──────────┴──────────────┘
//! value:  bincode, fixed-width integers, bounded by the payload limit
//! ```

use std::io::{Read, Write};

use bincode::Options;
use bytes::{Buf, BufMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{Result, RiposteError};
use super::{Call, Outcome, Value};

/// Longest string that fits the 2-byte length prefix
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

const NULL_MARKER: u8 = 0x00;
const STRING_MARKER: u8 = 0x01;

fn value_options(limit: usize) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(limit as u64)
        .allow_trailing_bytes()
}

// =============================================================================
// Writer
// =============================================================================

/// Appends protocol primitives to a byte buffer
pub struct WireWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::with_limit(MAX_PAYLOAD_SIZE)
    }

    /// Writer whose opaque values may not exceed `limit` bytes each
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(64),
            limit,
        }
    }

    /// Write a nullable string
    pub fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.buf.put_u8(NULL_MARKER),
            Some(s) => {
                if s.len() > MAX_STRING_LEN {
                    return Err(RiposteError::Codec(format!(
                        "String too long: {} bytes (max {})",
                        s.len(),
                        MAX_STRING_LEN
                    )));
                }
                self.buf.put_u8(STRING_MARKER);
                self.buf.put_u16(s.len() as u16);
                self.buf.put_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Write one opaque value
    pub fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = value_options(self.limit).serialize(value)?;
        self.buf.put_slice(&encoded);
        Ok(())
    }

    /// Write an argument array
    pub fn write_args(&mut self, args: &[Value]) -> Result<()> {
        self.write_value(args)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for WireWriter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Consumes protocol primitives from a byte slice
pub struct WireReader<'a> {
    buf: &'a [u8],
    limit: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_limit(bytes, MAX_PAYLOAD_SIZE)
    }

    pub fn with_limit(bytes: &'a [u8], limit: usize) -> Self {
        Self { buf: bytes, limit }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(RiposteError::Truncated {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Read a nullable string
    pub fn read_string(&mut self) -> Result<Option<String>> {
        self.need(1)?;
        match self.buf.get_u8() {
            NULL_MARKER => Ok(None),
            STRING_MARKER => {
                self.need(2)?;
                let len = self.buf.get_u16() as usize;
                self.need(len)?;

                let (text, rest) = self.buf.split_at(len);
                let text = std::str::from_utf8(text)
                    .map_err(|e| RiposteError::Codec(format!("Invalid UTF-8 in string: {}", e)))?;
                self.buf = rest;
                Ok(Some(text.to_string()))
            }
            marker => Err(RiposteError::Codec(format!(
                "Unknown string marker: 0x{:02x}",
                marker
            ))),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    /// Read one opaque value, leaving anything after it unread
    pub fn read_value<T: DeserializeOwned>(&mut self) -> Result<T> {
        let value = value_options(self.limit).deserialize_from(&mut self.buf)?;
        Ok(value)
    }

    /// Read an argument array
    pub fn read_args(&mut self) -> Result<Vec<Value>> {
        self.read_value()
    }
}

// =============================================================================
// Call Encoding/Decoding
// =============================================================================

/// Encode a call to bytes
///
/// Format: version + [auth_code] + service_id (4) + method_id (4) + args
pub fn encode_call(call: &Call, use_auth_code: bool) -> Result<Vec<u8>> {
    let mut writer = WireWriter::new();
    writer.write_string(call.version())?;
    if use_auth_code {
        writer.write_string(call.auth_code())?;
    }
    writer.write_i32(call.service_id());
    writer.write_i32(call.method_id());
    writer.write_args(call.args())?;
    Ok(writer.into_bytes())
}

/// Decode a complete call from bytes
///
/// Fails if any bytes follow the argument array.
pub fn decode_call(bytes: &[u8], use_auth_code: bool) -> Result<Call> {
    let mut reader = WireReader::new(bytes);
    let version = reader.read_string()?;
    let auth_code = if use_auth_code {
        reader.read_string()?
    } else {
        None
    };
    let service_id = reader.read_i32()?;
    let method_id = reader.read_i32()?;
    let args = reader.read_args()?;

    if reader.remaining() != 0 {
        return Err(RiposteError::Codec(format!(
            "Call has {} trailing bytes",
            reader.remaining()
        )));
    }

    Ok(Call::new(service_id, method_id, args)
        .with_version(version)
        .with_auth_code(auth_code))
}

// =============================================================================
// Outcome Encoding/Decoding
// =============================================================================

/// Encode an outcome to bytes
pub fn encode_outcome(outcome: &Outcome) -> Result<Vec<u8>> {
    let bytes = value_options(MAX_PAYLOAD_SIZE).serialize(outcome)?;
    Ok(bytes)
}

/// Decode an outcome from bytes
pub fn decode_outcome(bytes: &[u8]) -> Result<Outcome> {
    if bytes.is_empty() {
        return Err(RiposteError::Codec("Empty response".to_string()));
    }
    let mut reader = WireReader::new(bytes);
    let outcome = reader.read_value()?;
    if reader.remaining() != 0 {
        return Err(RiposteError::Codec(format!(
            "Response has {} trailing bytes",
            reader.remaining()
        )));
    }
    Ok(outcome)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a whole request body, refusing anything over `limit` bytes
pub fn read_body<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;

    if body.len() > limit {
        return Err(RiposteError::Codec(format!(
            "Payload too large: more than {} bytes",
            limit
        )));
    }
    Ok(body)
}

/// Write an outcome to a stream
pub fn write_outcome<W: Write>(writer: &mut W, outcome: &Outcome) -> Result<()> {
    let bytes = encode_outcome(outcome)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
