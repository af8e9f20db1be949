//! Post Client
//!
//! The main client type: packages calls, queues them for delivery and keeps
//! the registry of service marshallers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ClientConfig;
use crate::error::{Result, RiposteError};
use crate::protocol::{encode_call, Call, Value};
use super::listener::{notify_failed, Listener};
use super::queue::{PendingRequest, RequestQueue};
use super::service::ServiceAny;
use super::{Arg, HttpTransport, PostService, Transport};

/// Cause delivered for calls made after shutdown
pub const SHUT_DOWN: &str = "PostClient has been shut down";

/// Supplies the auth code streamed with each call
pub trait AuthCodeSource: Send + Sync {
    fn auth_code(&self, service_id: i32, method_id: i32, args: &[Value]) -> Option<String>;
}

/// Client for posting calls to one server
///
/// Cheap to clone; clones share the queue and registry.
#[derive(Clone)]
pub struct PostClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    queue: Arc<RequestQueue>,
    default_listener: Option<Listener>,
    auth_code: RwLock<Option<String>>,
    auth_source: Option<Arc<dyn AuthCodeSource>>,
    services: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

/// Builder for PostClient
pub struct PostClientBuilder {
    config: ClientConfig,
    default_listener: Option<Listener>,
    auth_source: Option<Arc<dyn AuthCodeSource>>,
    transport: Option<Arc<dyn Transport>>,
}

impl PostClientBuilder {
    /// Listener used for calls that carry none of their own
    pub fn default_listener(mut self, listener: Listener) -> Self {
        self.default_listener = Some(listener);
        self
    }

    /// Replace the stored auth code with a computed one
    pub fn auth_code_source(mut self, source: Arc<dyn AuthCodeSource>) -> Self {
        self.auth_source = Some(source);
        self
    }

    /// Use `transport` instead of HTTP
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<PostClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        Ok(PostClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                queue: RequestQueue::new(transport),
                default_listener: self.default_listener,
                auth_code: RwLock::new(None),
                auth_source: self.auth_source,
                services: RwLock::new(HashMap::new()),
            }),
        })
    }
}

impl PostClient {
    /// Create an HTTP client with no default listener
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> PostClientBuilder {
        PostClientBuilder {
            config,
            default_listener: None,
            auth_source: None,
            transport: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Queue a call. Never blocks on the network.
    ///
    /// Listener arguments are pulled out and notified with the outcome; the
    /// remaining arguments are sent in order.
    pub fn send_request(&self, service_id: i32, method_id: i32, args: Vec<Arg>) {
        let mut listeners = Vec::new();
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Listener(listener) => listeners.push(listener),
                Arg::Value(value) => values.push(value),
            }
        }
        if listeners.is_empty() {
            if let Some(listener) = &self.inner.default_listener {
                listeners.push(listener.clone());
            }
        }

        if self.inner.queue.is_shutdown() {
            notify_failed(&listeners, SHUT_DOWN);
            return;
        }

        let bytes = match self.encode(service_id, method_id, values) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(service_id, method_id, "Failed to encode call: {}", e);
                notify_failed(&listeners, &e.to_string());
                return;
            }
        };

        tracing::trace!(service_id, method_id, len = bytes.len(), "Queueing call");
        if let Err(rejected) = self.inner.queue.enqueue(PendingRequest::new(bytes, listeners)) {
            notify_failed(rejected.listeners(), SHUT_DOWN);
        }
    }

    fn encode(&self, service_id: i32, method_id: i32, args: Vec<Value>) -> Result<Vec<u8>> {
        let config = &self.inner.config;
        let auth_code = if config.use_auth_code {
            self.auth_code_for(service_id, method_id, &args)
        } else {
            None
        };

        let call = Call::new(service_id, method_id, args)
            .with_version(config.version.clone())
            .with_auth_code(auth_code);
        encode_call(&call, config.use_auth_code)
    }

    fn auth_code_for(&self, service_id: i32, method_id: i32, args: &[Value]) -> Option<String> {
        match &self.inner.auth_source {
            Some(source) => source.auth_code(service_id, method_id, args),
            None => self.inner.auth_code.read().clone(),
        }
    }

    /// Set the auth code sent with each call.
    ///
    /// Ignored (with a warning) when auth-code streaming is disabled.
    pub fn set_auth_code(&self, auth_code: impl Into<String>) {
        if !self.inner.config.use_auth_code {
            tracing::warn!(
                "This PostClient was not configured to use auth codes, this auth code will be ignored"
            );
            return;
        }
        *self.inner.auth_code.write() = Some(auth_code.into());
    }

    /// Stop the client. Calls made afterwards fail immediately.
    ///
    /// See [`RequestQueue::shutdown`] for what happens to queued calls.
    pub fn shutdown(&self, allow_queue_to_complete: bool) {
        self.inner.queue.shutdown(allow_queue_to_complete);
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.queue.is_shutdown()
    }

    /// Calls queued behind the one in flight
    pub fn pending_requests(&self) -> usize {
        self.inner.queue.pending_len()
    }

    // =========================================================================
    // Service Registry
    // =========================================================================

    /// Register a marshaller and bind it to this client
    pub fn register_service<T: PostService>(&self, marshaller: Arc<T>) {
        marshaller.init(self);
        self.inner
            .services
            .write()
            .insert(TypeId::of::<T>(), marshaller);
    }

    /// Register a batch of marshallers keyed by their declared type.
    ///
    /// Entries whose marshaller is not of the declared type are skipped.
    pub fn register_services<I>(&self, services: I)
    where
        I: IntoIterator<Item = (TypeId, Arc<dyn PostService>)>,
    {
        for (declared, marshaller) in services {
            let any = Arc::clone(&marshaller).into_any();
            if (*any).type_id() != declared {
                tracing::debug!("Skipping marshaller that does not implement its declared service");
                continue;
            }
            marshaller.init(self);
            self.inner.services.write().insert(declared, any);
        }
    }

    /// The registered marshaller of type `T`, if any
    pub fn get_service<T: PostService>(&self) -> Option<Arc<T>> {
        let any = self.inner.services.read().get(&TypeId::of::<T>()).cloned()?;
        any.downcast::<T>().ok()
    }

    /// The registered marshaller of type `T`, or an error naming it
    pub fn require_service<T: PostService>(&self) -> Result<Arc<T>> {
        self.get_service::<T>()
            .ok_or(RiposteError::ServiceUnavailable(std::any::type_name::<T>()))
    }
}
