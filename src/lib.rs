//! # Riposte
//!
//! Binary RPC over HTTP POST:
//! - Versioned calls with an optional auth code
//! - Numeric service/method routing on the server
//! - Two-tier errors: client-reportable vs. logged internal failures
//! - Single-flight client queue with listener callbacks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       PostClient                             │
//! │          send_request ──► RequestQueue (FIFO)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  HTTP POST (one exchange in flight)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    RiposteServer                             │
//! │                 (axum, blocking pool)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  RequestProcessor                            │
//! │      decode ─► version check ─► resolve ─► invoke            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │ DispatchTable │──► ServiceHandler
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod server;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PostError, Result, RiposteError};
pub use config::{ClientConfig, ServerConfig};
pub use protocol::{Call, Outcome, Value};
pub use server::{DispatchTable, MethodTable, RequestProcessor, RiposteServer, ServiceHandler};
pub use client::{Arg, Listener, PostClient};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Riposte
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
