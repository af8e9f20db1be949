//! Dispatch Table
//!
//! Maps service ids to handlers, and each handler maps method ids to
//! invocable methods.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::PostError;
use crate::protocol::Value;

/// Per-call context handed to the handler for the duration of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub service_id: i32,
    pub method_id: i32,

    /// Auth code streamed with the call, when the deployment enables it
    pub auth_code: Option<String>,
}

/// The routing unit for one logical service
pub trait ServiceHandler: Send + Sync {
    /// Invoke the method with the given id
    fn dispatch(&self, method_id: i32, args: Vec<Value>, ctx: &CallContext)
        -> Result<Value, PostError>;

    /// Name of the method with the given id, for diagnostics.
    ///
    /// Must not depend on the method ever having been invoked.
    fn method_name(&self, method_id: i32) -> Option<&str>;
}

/// Service id → handler mapping
///
/// Populated before serving, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<i32, Arc<dyn ServiceHandler>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handler for `service_id`, returning the old one
    pub fn register(
        &mut self,
        service_id: i32,
        handler: Arc<dyn ServiceHandler>,
    ) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.insert(service_id, handler)
    }

    pub fn resolve(&self, service_id: i32) -> Option<&Arc<dyn ServiceHandler>> {
        self.handlers.get(&service_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered service ids, in no particular order
    pub fn service_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.handlers.keys().copied()
    }
}

impl FromIterator<(i32, Arc<dyn ServiceHandler>)> for DispatchTable {
    fn from_iter<I: IntoIterator<Item = (i32, Arc<dyn ServiceHandler>)>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<i32> = self.service_ids().collect();
        ids.sort_unstable();
        f.debug_struct("DispatchTable").field("services", &ids).finish()
    }
}

// =============================================================================
// Closure-backed handler
// =============================================================================

type MethodFn = Box<dyn Fn(Vec<Value>, &CallContext) -> Result<Value, PostError> + Send + Sync>;

struct Method {
    name: String,
    invoke: MethodFn,
}

/// A [`ServiceHandler`] assembled from named closures
///
/// Unknown method ids fail with the client-reportable `e.method_not_found`.
pub struct MethodTable {
    service: String,
    methods: HashMap<i32, Method>,
}

impl MethodTable {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            methods: HashMap::new(),
        }
    }

    /// Add a method; a later method with the same id replaces the earlier one
    pub fn method<F>(mut self, method_id: i32, name: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(Vec<Value>, &CallContext) -> Result<Value, PostError> + Send + Sync + 'static,
    {
        self.methods.insert(
            method_id,
            Method {
                name: name.into(),
                invoke: Box::new(invoke),
            },
        );
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }
}

impl ServiceHandler for MethodTable {
    fn dispatch(
        &self,
        method_id: i32,
        args: Vec<Value>,
        ctx: &CallContext,
    ) -> Result<Value, PostError> {
        match self.methods.get(&method_id) {
            Some(method) => (method.invoke)(args, ctx),
            None => {
                tracing::debug!(service = %self.service, method_id, "Method not found");
                Err(PostError::method_not_found())
            }
        }
    }

    fn method_name(&self, method_id: i32) -> Option<&str> {
        self.methods.get(&method_id).map(|m| m.name.as_str())
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(&i32, &str)> =
            self.methods.iter().map(|(id, m)| (id, m.name.as_str())).collect();
        names.sort_unstable();
        f.debug_struct("MethodTable")
            .field("service", &self.service)
            .field("methods", &names)
            .finish()
    }
}
