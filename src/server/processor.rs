//! Request Processor
//!
//! Runs one posted call through decode → validate → dispatch → encode.
//! Every failure becomes an error outcome for the client; only internal
//! failures are logged.

use std::fmt;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::{PostError, Result, RiposteError};
use crate::protocol::{codes, encode_outcome, read_body, Outcome, Value, WireReader};
use super::{CallContext, DispatchTable, ServiceHandler};

/// Method name used in logs when the handler cannot name the method
pub const UNKNOWN_METHOD: &str = "UNKNOWN METHOD";

/// Longest prefix of a rejected body included in the log
const HEX_DUMP_LIMIT: usize = 256;

/// Server-side call processor
///
/// Holds no mutable state; any number of requests may run through one
/// processor concurrently.
pub struct RequestProcessor {
    /// Routing table (read-only once shared)
    dispatch: Arc<DispatchTable>,

    /// Version every call must carry
    client_version: Option<String>,

    /// Whether calls carry an auth code
    use_auth_code: bool,

    /// Largest accepted body for stream input
    max_payload_size: usize,
}

/// A fully decoded call, bound to its handler
struct Invocation<'a> {
    handler: &'a dyn ServiceHandler,
    ctx: CallContext,
    args: Vec<Value>,
}

impl<'a> Invocation<'a> {
    fn method_name(&self) -> &'a str {
        self.handler
            .method_name(self.ctx.method_id)
            .unwrap_or(UNKNOWN_METHOD)
    }

    /// Call the handler, containing any panic as an internal failure
    fn invoke(self) -> std::result::Result<Value, PostError> {
        let Invocation { handler, ctx, args } = self;
        let method_id = ctx.method_id;
        match panic::catch_unwind(AssertUnwindSafe(|| handler.dispatch(method_id, args, &ctx))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "service method panicked".to_string());
                Err(PostError::internal(message))
            }
        }
    }
}

impl RequestProcessor {
    /// Create a processor over a table that is still exclusively owned
    pub fn new(config: &ServerConfig, dispatch: DispatchTable) -> Self {
        Self::with_table(config, Arc::new(dispatch))
    }

    /// Create a processor over a shared table
    pub fn with_table(config: &ServerConfig, dispatch: Arc<DispatchTable>) -> Self {
        Self {
            dispatch,
            client_version: config.client_version.clone(),
            use_auth_code: config.use_auth_code,
            max_payload_size: config.max_payload_size,
        }
    }

    /// Register a handler before serving begins.
    ///
    /// Fails once the table is shared, since live traffic may be reading it.
    pub fn register_handler(
        &mut self,
        service_id: i32,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<()> {
        let table = Arc::get_mut(&mut self.dispatch).ok_or_else(|| {
            RiposteError::Config(format!(
                "cannot register service {}: dispatch table is shared",
                service_id
            ))
        })?;
        if table.register(service_id, handler).is_some() {
            tracing::debug!(service_id, "Replaced handler");
        }
        Ok(())
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    pub fn client_version(&self) -> Option<&str> {
        self.client_version.as_deref()
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process one request body and return the encoded outcome
    pub fn process(&self, input: &[u8]) -> Vec<u8> {
        let outcome = self.handle(input);
        match encode_outcome(&outcome) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to encode outcome: {}", e);
                encode_outcome(&Outcome::error(e.to_string())).unwrap_or_default()
            }
        }
    }

    /// Read a request from `reader`, write the outcome to `writer`.
    ///
    /// Both ends are owned by this call and released when it returns.
    pub fn process_stream<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        let bytes = match read_body(&mut reader, self.max_payload_size) {
            Ok(body) => self.process(&body),
            Err(RiposteError::Io(e)) => return Err(RiposteError::Io(e)),
            Err(e) => {
                tracing::warn!("Rejected request body: {}", e);
                encode_outcome(&Outcome::error(codes::STREAMING_ERROR))?
            }
        };
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Run one call to its outcome
    pub fn handle(&self, input: &[u8]) -> Outcome {
        let invocation = match self.decode(input) {
            Ok(invocation) => invocation,
            Err(err) => return Outcome::error(err.cause()),
        };

        let method_name = invocation.method_name();
        let (service_id, method_id) = (invocation.ctx.service_id, invocation.ctx.method_id);
        tracing::trace!(service_id, method_id, method = %method_name, "Dispatching call");

        match invocation.invoke() {
            Ok(value) => Outcome::Result(value),
            Err(err) => {
                if err.is_loggable() {
                    self.log_service_failure(&err, method_name, service_id, method_id);
                }
                Outcome::error(err.cause())
            }
        }
    }

    fn log_service_failure(&self, err: &PostError, method_name: &str, service_id: i32, method_id: i32) {
        match std::error::Error::source(err) {
            Some(source) => tracing::error!(
                method = %method_name,
                service_id,
                method_id,
                source = %source,
                "doServiceCall failure in {}: {}",
                method_name,
                err
            ),
            None => tracing::error!(
                method = %method_name,
                service_id,
                method_id,
                "doServiceCall failure in {}: {}",
                method_name,
                err
            ),
        }
    }

    /// Decode the call and bind it to its handler.
    ///
    /// The version is checked before anything past it is decoded.
    fn decode(&self, input: &[u8]) -> std::result::Result<Invocation<'_>, PostError> {
        let mut reader = WireReader::with_limit(input, self.max_payload_size);

        let version = reader
            .read_string()
            .map_err(|e| reject(input, format_args!("Exception encountered streaming the version: {}", e)))?;
        if version.as_deref() != self.client_version.as_deref() {
            tracing::debug!(
                required = ?self.client_version,
                supplied = ?version,
                "Version mismatch from client"
            );
            return Err(PostError::version_mismatch());
        }

        let (auth_code, service_id, method_id) = self.decode_preamble(&mut reader).map_err(|e| {
            reject(input, format_args!("Exception encountered streaming the pre-args values: {}", e))
        })?;

        let args = reader.read_args().map_err(|e| {
            reject(
                input,
                format_args!(
                    "Exception encountered streaming the args of {}/{}: {}",
                    service_id, method_id, e
                ),
            )
        })?;

        if reader.remaining() != 0 {
            return Err(reject(
                input,
                format_args!(
                    "Call to {}/{} has {} extra bytes",
                    service_id,
                    method_id,
                    reader.remaining()
                ),
            ));
        }

        let handler = self.dispatch.resolve(service_id).ok_or_else(|| {
            reject(input, format_args!("Dispatcher not found for service {}", service_id))
        })?;

        Ok(Invocation {
            handler: handler.as_ref(),
            ctx: CallContext {
                service_id,
                method_id,
                auth_code,
            },
            args,
        })
    }

    fn decode_preamble(&self, reader: &mut WireReader<'_>) -> Result<(Option<String>, i32, i32)> {
        let auth_code = if self.use_auth_code {
            reader.read_string()?
        } else {
            None
        };
        let service_id = reader.read_i32()?;
        let method_id = reader.read_i32()?;
        Ok((auth_code, service_id, method_id))
    }
}

/// Log a rejected body once, with a hex dump of its head
fn reject(input: &[u8], reason: fmt::Arguments<'_>) -> PostError {
    tracing::warn!(
        len = input.len(),
        in_bytes = %hex::encode(&input[..input.len().min(HEX_DUMP_LIMIT)]),
        "Got streaming error from client: {}",
        reason
    );
    PostError::streaming()
}
