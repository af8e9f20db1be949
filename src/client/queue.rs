//! Request Queue
//!
//! FIFO of encoded calls with at most one exchange in flight.
//!
//! ## Concurrency Model: Single Flight
//!
//! - `enqueue` appends under the state lock and, if nothing is in flight,
//!   marks the queue busy and starts a delivery thread
//! - the delivery thread pops, exchanges, notifies, and repeats; it clears
//!   `in_flight` only when it finds the queue empty, under the same lock
//!   it pops with, so a second delivery thread can never start early
//! - `enqueue` never touches the network
//! - transport and listener panics are contained, so the loop always gets
//!   back to the empty-queue check

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::error::RiposteError;
use crate::protocol::{decode_outcome, Outcome};
use super::listener::{notify_failed, notify_processed, Listener};
use super::Transport;

/// Cause delivered when a response carries no body
pub const EMPTY_RESPONSE: &str = "Return value from invocation call is null";

/// Cause delivered when the transport panics mid-exchange
pub const TRANSPORT_PANICKED: &str = "Transport panicked during the exchange";

/// An encoded call waiting for delivery
pub struct PendingRequest {
    bytes: Vec<u8>,
    listeners: Vec<Listener>,
}

impl PendingRequest {
    pub fn new(bytes: Vec<u8>, listeners: Vec<Listener>) -> Self {
        Self { bytes, listeners }
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }
}

struct QueueState {
    pending: VecDeque<PendingRequest>,
    in_flight: bool,
    shutdown: bool,
}

/// Single-flight delivery queue
pub struct RequestQueue {
    state: Mutex<QueueState>,
    transport: Arc<dyn Transport>,
}

impl RequestQueue {
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: false,
                shutdown: false,
            }),
            transport,
        })
    }

    /// Append a request and make sure delivery is running.
    ///
    /// Hands the request back untouched if the queue has been shut down.
    pub fn enqueue(self: &Arc<Self>, request: PendingRequest) -> Result<(), PendingRequest> {
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return Err(request);
            }
            state.pending.push_back(request);
            if state.in_flight {
                return Ok(());
            }
            state.in_flight = true;
        }

        self.start_delivery();
        Ok(())
    }

    /// Stop accepting requests. Idempotent.
    ///
    /// Without `allow_queue_to_complete`, requests not yet started are
    /// dropped and their listeners never hear back. An exchange already in
    /// flight always finishes.
    pub fn shutdown(&self, allow_queue_to_complete: bool) {
        let mut state = self.state.lock();
        if state.shutdown {
            return;
        }
        state.shutdown = true;
        if !allow_queue_to_complete {
            let dropped = state.pending.len();
            state.pending.clear();
            tracing::debug!(dropped, "Cleared pending requests on shutdown");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Requests waiting behind the one in flight
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Caller has already set `in_flight`
    fn start_delivery(self: &Arc<Self>) {
        let queue = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("riposte-delivery".to_string())
            .spawn(move || queue.drain());

        if let Err(e) = spawned {
            tracing::error!("Failed to start delivery thread: {}", e);
            let failed: Vec<PendingRequest> = {
                let mut state = self.state.lock();
                state.in_flight = false;
                state.pending.drain(..).collect()
            };
            let cause = e.to_string();
            for request in failed {
                notify_failed(&request.listeners, &cause);
            }
        }
    }

    fn drain(&self) {
        loop {
            let request = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(request) => request,
                    None => {
                        state.in_flight = false;
                        return;
                    }
                }
            };

            self.deliver(request);
        }
    }

    fn deliver(&self, request: PendingRequest) {
        let PendingRequest { bytes, listeners } = request;
        let exchanged = panic::catch_unwind(AssertUnwindSafe(|| self.transport.exchange(bytes)))
            .unwrap_or_else(|_| Err(RiposteError::Transport(TRANSPORT_PANICKED.to_string())));
        match exchanged {
            Ok(body) => request_complete(&listeners, &body),
            Err(e) => {
                tracing::warn!("Exception processing request: {}", e);
                notify_failed(&listeners, &failure_cause(&e));
            }
        }
    }
}

/// Route a response body to the listeners
fn request_complete(listeners: &[Listener], body: &[u8]) {
    if body.is_empty() {
        tracing::warn!("Return value from RPC call is empty");
        notify_failed(listeners, EMPTY_RESPONSE);
        return;
    }

    match decode_outcome(body) {
        Ok(Outcome::Error(err)) => notify_failed(listeners, err.cause()),
        Ok(Outcome::Result(value)) => notify_processed(listeners, value),
        Err(e) => {
            tracing::warn!("Failed to decode response: {}", e);
            notify_failed(listeners, &e.to_string());
        }
    }
}

/// The message of the underlying failure, without our own prefix
fn failure_cause(err: &RiposteError) -> String {
    match err {
        RiposteError::Transport(message) => message.clone(),
        RiposteError::Http(e) => e.to_string(),
        RiposteError::Io(e) => e.to_string(),
        other => other.to_string(),
    }
}
