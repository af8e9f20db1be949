//! Riposte Server Binary
//!
//! Serves a small echo service over HTTP, for smoke-testing clients.

use std::sync::Arc;

use clap::Parser;
use riposte::server::validate;
use riposte::{DispatchTable, MethodTable, PostError, RequestProcessor, RiposteServer, ServerConfig, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// Service id of the built-in echo service
const ECHO_SERVICE_ID: i32 = 1;

/// Riposte Server
#[derive(Parser, Debug)]
#[command(name = "riposte-server")]
#[command(about = "Binary RPC over HTTP POST")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Route calls are posted to
    #[arg(short, long, default_value = "/riposte")]
    path: String,

    /// Version clients must send (omit to accept only unversioned clients)
    #[arg(short, long)]
    client_version: Option<String>,

    /// Expect an auth code after the version string
    #[arg(short, long)]
    auth_code: bool,
}

fn echo_service() -> MethodTable {
    MethodTable::new("EchoService")
        .method(1, "echo", |args, _ctx| Ok(Value::List(args)))
        .method(2, "ping", |_args, _ctx| Ok(Value::from("pong")))
        .method(3, "fail", |args, _ctx| {
            let message = validate::arg(&args, 0)?;
            let message = validate::check_some(message.as_str(), "fail expects a string")?;
            Err(PostError::reportable(message))
        })
        .method(4, "whoami", |_args, ctx| Ok(Value::from(ctx.auth_code.clone())))
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,riposte=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Riposte Server v{}", riposte::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let mut builder = ServerConfig::builder()
        .listen_addr(&args.listen)
        .path(&args.path)
        .use_auth_code(args.auth_code);
    if let Some(version) = &args.client_version {
        builder = builder.client_version(version);
    }
    let config = builder.build();

    let mut dispatch = DispatchTable::new();
    dispatch.register(ECHO_SERVICE_ID, Arc::new(echo_service()));

    let processor = RequestProcessor::new(&config, dispatch);
    let server = RiposteServer::new(config, processor);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
