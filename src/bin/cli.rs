//! Riposte CLI Client
//!
//! Posts a single call and prints the outcome.

use clap::Parser;
use riposte::client::channel;
use riposte::{Arg, ClientConfig, Outcome, PostClient, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// Riposte CLI
#[derive(Parser, Debug)]
#[command(name = "riposte-cli")]
#[command(about = "Post a call to a Riposte server")]
struct Args {
    /// Server URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080/riposte")]
    server: String,

    /// Version string to send
    #[arg(short = 'V', long)]
    client_version: Option<String>,

    /// Auth code to send (enables auth-code streaming)
    #[arg(short, long)]
    auth_code: Option<String>,

    /// Exchange timeout in milliseconds (0 waits forever)
    #[arg(short, long, default_value = "10000")]
    timeout_ms: u64,

    /// Service id
    service_id: i32,

    /// Method id
    method_id: i32,

    /// Arguments; integers are sent as ints, everything else as strings
    args: Vec<String>,
}

fn parse_arg(raw: &str) -> Value {
    match raw.parse::<i32>() {
        Ok(i) => Value::Int(i),
        Err(_) => Value::from(raw),
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut builder = ClientConfig::builder()
        .service_address(&args.server)
        .use_auth_code(args.auth_code.is_some())
        .request_timeout_ms(args.timeout_ms);
    if let Some(version) = &args.client_version {
        builder = builder.version(version);
    }

    let client = match PostClient::new(builder.build()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(code) = args.auth_code {
        client.set_auth_code(code);
    }

    let (listener, outcome) = channel();
    let mut call_args: Vec<Arg> = args.args.iter().map(|raw| Arg::from(parse_arg(raw))).collect();
    call_args.push(Arg::from(listener));

    client.send_request(args.service_id, args.method_id, call_args);
    client.shutdown(true);

    match outcome.recv() {
        Ok(Outcome::Result(value)) => println!("{:?}", value),
        Ok(Outcome::Error(err)) => {
            eprintln!("Call failed: {}", err.cause());
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Call was dropped without an outcome");
            std::process::exit(1);
        }
    }
}
