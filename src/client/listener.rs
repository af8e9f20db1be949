//! Listeners
//!
//! Callbacks that receive the outcome of a call. Every call notifies its
//! listeners exactly once: either a failure, or (for listeners that want it)
//! the result.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};

use crate::protocol::{Outcome, Value};

/// Receives call failures
pub trait PostListener: Send + Sync {
    fn request_failed(&self, cause: &str);
}

/// Receives call failures and results
pub trait PostResultListener: PostListener {
    fn request_processed(&self, result: Value);
}

/// A listener attached to a call
#[derive(Clone)]
pub enum Listener {
    /// Only told about failures; successful results are dropped
    FailureOnly(Arc<dyn PostListener>),

    /// Told about failures and results
    WithResult(Arc<dyn PostResultListener>),
}

impl Listener {
    pub fn failure_only(listener: impl PostListener + 'static) -> Self {
        Listener::FailureOnly(Arc::new(listener))
    }

    pub fn with_result(listener: impl PostResultListener + 'static) -> Self {
        Listener::WithResult(Arc::new(listener))
    }

    /// Failure-only listener backed by a closure
    pub fn on_failure<F>(on_failure: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Listener::failure_only(FailureFn(on_failure))
    }

    /// Listener backed by a pair of closures
    pub fn on_outcome<S, F>(on_success: S, on_failure: F) -> Self
    where
        S: Fn(Value) + Send + Sync + 'static,
        F: Fn(&str) + Send + Sync + 'static,
    {
        Listener::with_result(OutcomeFns {
            on_success,
            on_failure,
        })
    }

    pub fn wants_result(&self) -> bool {
        matches!(self, Listener::WithResult(_))
    }

    pub fn request_failed(&self, cause: &str) {
        match self {
            Listener::FailureOnly(listener) => listener.request_failed(cause),
            Listener::WithResult(listener) => listener.request_failed(cause),
        }
    }

    /// Deliver a result; failure-only listeners ignore it
    pub fn request_processed(&self, result: Value) {
        if let Listener::WithResult(listener) = self {
            listener.request_processed(result);
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::FailureOnly(_) => f.write_str("Listener::FailureOnly"),
            Listener::WithResult(_) => f.write_str("Listener::WithResult"),
        }
    }
}

/// Run one listener callback; a panic is logged and does not reach the
/// listeners after it
fn guarded(listener: &Listener, callback: impl FnOnce(&Listener)) {
    if panic::catch_unwind(AssertUnwindSafe(|| callback(listener))).is_err() {
        tracing::error!(listener = ?listener, "Listener panicked; notifying the rest");
    }
}

pub(crate) fn notify_failed(listeners: &[Listener], cause: &str) {
    for listener in listeners {
        guarded(listener, |l| l.request_failed(cause));
    }
}

pub(crate) fn notify_processed(listeners: &[Listener], result: Value) {
    for listener in listeners.iter().filter(|l| l.wants_result()) {
        guarded(listener, |l| l.request_processed(result.clone()));
    }
}

// =============================================================================
// Provided listeners
// =============================================================================

struct FailureFn<F>(F);

impl<F> PostListener for FailureFn<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn request_failed(&self, cause: &str) {
        (self.0)(cause)
    }
}

struct OutcomeFns<S, F> {
    on_success: S,
    on_failure: F,
}

impl<S, F> PostListener for OutcomeFns<S, F>
where
    S: Fn(Value) + Send + Sync,
    F: Fn(&str) + Send + Sync,
{
    fn request_failed(&self, cause: &str) {
        (self.on_failure)(cause)
    }
}

impl<S, F> PostResultListener for OutcomeFns<S, F>
where
    S: Fn(Value) + Send + Sync,
    F: Fn(&str) + Send + Sync,
{
    fn request_processed(&self, result: Value) {
        (self.on_success)(result)
    }
}

/// Forwards the outcome of a call into a channel
pub struct ChannelListener {
    tx: Sender<Outcome>,
}

impl PostListener for ChannelListener {
    fn request_failed(&self, cause: &str) {
        // Receiver may have given up waiting
        let _ = self.tx.send(Outcome::error(cause));
    }
}

impl PostResultListener for ChannelListener {
    fn request_processed(&self, result: Value) {
        let _ = self.tx.send(Outcome::Result(result));
    }
}

/// Create a listener whose outcome arrives on the returned receiver
pub fn channel() -> (Listener, Receiver<Outcome>) {
    let (tx, rx) = channel::unbounded();
    (Listener::with_result(ChannelListener { tx }), rx)
}
