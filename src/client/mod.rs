//! Client Module
//!
//! Packages calls, delivers them one at a time over HTTP and fans the
//! outcome out to listeners.
//!
//! ## Call Flow
//! ```text
//! send_request ──► encode ──► RequestQueue ──► Transport (POST) ──► decode ──► Listeners
//!                              (FIFO, single flight)
//! ```

mod listener;
mod post_client;
mod queue;
mod service;
mod transport;

pub use listener::{channel, ChannelListener, Listener, PostListener, PostResultListener};
pub use post_client::{AuthCodeSource, PostClient, PostClientBuilder, SHUT_DOWN};
pub use queue::{PendingRequest, RequestQueue, EMPTY_RESPONSE, TRANSPORT_PANICKED};
pub use service::{PostService, ServiceAny, ServiceBinding, NOT_REGISTERED};
pub use transport::{HttpTransport, Transport};

use crate::protocol::Value;

/// One argument of a call: either a wire value or a listener for its outcome
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Listener(Listener),
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<Listener> for Arg {
    fn from(listener: Listener) -> Self {
        Arg::Listener(listener)
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_value!(bool, i32, i64, f64, &str, String, Vec<u8>, Vec<Value>);
