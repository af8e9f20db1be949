//! Server Module
//!
//! Decodes posted calls, routes them to service handlers and encodes the
//! outcome.
//!
//! ## Architecture
//! - HTTP front end (axum) hands each body to the blocking pool
//! - `RequestProcessor` runs one call to completion per body
//! - `DispatchTable` is built before serving and shared read-only

mod dispatch;
mod processor;
mod http;
pub mod validate;

pub use dispatch::{CallContext, DispatchTable, MethodTable, ServiceHandler};
pub use processor::{RequestProcessor, UNKNOWN_METHOD};
pub use http::RiposteServer;
