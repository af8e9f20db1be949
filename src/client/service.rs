//! Client-side service marshallers
//!
//! A marshaller is the typed face of one remote service: its methods turn
//! arguments into `send_request` calls on the client it was registered with.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use super::listener::notify_failed;
use super::{Arg, PostClient};

/// Cause delivered when a marshaller is used before registration
pub const NOT_REGISTERED: &str = "Service marshaller is not registered with a client";

/// Converts a concrete marshaller into `Any` for the service registry
pub trait ServiceAny {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> ServiceAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A service marshaller that can be registered with a [`PostClient`]
pub trait PostService: ServiceAny + Send + Sync + 'static {
    /// Called once on registration with the client to route calls through
    fn init(&self, client: &PostClient);
}

/// Holds the client a marshaller was registered with
#[derive(Default)]
pub struct ServiceBinding {
    client: OnceLock<PostClient>,
}

impl ServiceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to `client`; later binds are ignored
    pub fn bind(&self, client: &PostClient) {
        if self.client.set(client.clone()).is_err() {
            tracing::debug!("Marshaller already bound; ignoring rebind");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.client.get().is_some()
    }

    /// Send through the bound client, failing the call's listeners if unbound
    pub fn send_request(&self, service_id: i32, method_id: i32, args: Vec<Arg>) {
        match self.client.get() {
            Some(client) => client.send_request(service_id, method_id, args),
            None => {
                let listeners: Vec<_> = args
                    .into_iter()
                    .filter_map(|arg| match arg {
                        Arg::Listener(listener) => Some(listener),
                        Arg::Value(_) => None,
                    })
                    .collect();
                notify_failed(&listeners, NOT_REGISTERED);
            }
        }
    }
}
