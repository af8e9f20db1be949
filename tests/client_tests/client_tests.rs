//! Tests for PostClient
//!
//! These tests verify:
//! - Service marshaller registration and lookup
//! - Auth code streaming (stored and computed)
//! - Version and auth code framing on the wire

use std::any::TypeId;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use riposte::client::{
    channel, Arg, AuthCodeSource, Listener, PostClient, PostService, ServiceBinding, Transport,
    NOT_REGISTERED,
};
use riposte::protocol::{decode_call, Outcome, Value};
use riposte::server::{DispatchTable, MethodTable, RequestProcessor};
use riposte::{ClientConfig, Result, RiposteError, ServerConfig};

const WAIT: Duration = Duration::from_secs(5);
const GREETER_ID: i32 = 3;

// =============================================================================
// Helper Functions
// =============================================================================

/// Processes calls in-process and keeps the raw bodies it saw
struct RecordingTransport {
    processor: RequestProcessor,
    use_auth_code: bool,
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl RecordingTransport {
    fn new(use_auth_code: bool) -> Arc<Self> {
        let mut dispatch = DispatchTable::new();
        dispatch.register(
            GREETER_ID,
            Arc::new(
                MethodTable::new("Greeter")
                    .method(1, "greet", |args, _ctx| {
                        let name = args.first().and_then(Value::as_str).unwrap_or("nobody");
                        Ok(Value::from(format!("hello, {}", name)))
                    })
                    .method(2, "whoami", |_args, ctx| Ok(Value::from(ctx.auth_code.clone()))),
            ),
        );
        let config = ServerConfig::builder()
            .client_version("v1")
            .use_auth_code(use_auth_code)
            .build();

        Arc::new(Self {
            processor: RequestProcessor::new(&config, dispatch),
            use_auth_code,
            bodies: Mutex::new(Vec::new()),
        })
    }

    fn last_call(&self) -> riposte::Call {
        let bodies = self.bodies.lock();
        decode_call(bodies.last().unwrap(), self.use_auth_code).unwrap()
    }
}

impl Transport for RecordingTransport {
    fn exchange(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self.processor.process(&body);
        self.bodies.lock().push(body);
        Ok(response)
    }
}

fn client(transport: Arc<RecordingTransport>, use_auth_code: bool) -> PostClient {
    let config = ClientConfig::builder()
        .version("v1")
        .use_auth_code(use_auth_code)
        .build();
    PostClient::builder(config).transport(transport).build().unwrap()
}

/// Typed marshaller for the greeter service
#[derive(Default)]
struct GreeterMarshaller {
    binding: ServiceBinding,
}

impl GreeterMarshaller {
    fn greet(&self, name: &str, listener: Listener) {
        self.binding
            .send_request(GREETER_ID, 1, vec![Arg::from(name), Arg::from(listener)]);
    }

    fn whoami(&self, listener: Listener) {
        self.binding.send_request(GREETER_ID, 2, vec![Arg::from(listener)]);
    }
}

impl PostService for GreeterMarshaller {
    fn init(&self, client: &PostClient) {
        self.binding.bind(client);
    }
}

/// A marshaller for a service this client never talks to
#[derive(Default)]
struct OtherMarshaller {
    binding: ServiceBinding,
}

impl PostService for OtherMarshaller {
    fn init(&self, client: &PostClient) {
        self.binding.bind(client);
    }
}

fn greet(marshaller: &GreeterMarshaller, name: &str) -> Receiver<Outcome> {
    let (listener, rx) = channel();
    marshaller.greet(name, listener);
    rx
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_register_service_binds_marshaller() {
    let client = client(RecordingTransport::new(false), false);
    client.register_service(Arc::new(GreeterMarshaller::default()));

    let greeter = client.require_service::<GreeterMarshaller>().unwrap();
    assert!(greeter.binding.is_bound());

    let rx = greet(&greeter, "ada");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Outcome::ok("hello, ada"));
}

#[test]
fn test_get_missing_service() {
    let client = client(RecordingTransport::new(false), false);

    assert!(client.get_service::<GreeterMarshaller>().is_none());
    assert!(matches!(
        client.require_service::<GreeterMarshaller>(),
        Err(RiposteError::ServiceUnavailable(_))
    ));
}

#[test]
fn test_register_services_skips_mismatched_entries() {
    let client = client(RecordingTransport::new(false), false);
    let greeter = Arc::new(GreeterMarshaller::default());
    let impostor = Arc::new(GreeterMarshaller::default());

    let greeter_entry: Arc<dyn PostService> = greeter.clone();
    let impostor_entry: Arc<dyn PostService> = impostor.clone();
    let services = vec![
        (TypeId::of::<GreeterMarshaller>(), greeter_entry),
        (TypeId::of::<OtherMarshaller>(), impostor_entry),
    ];
    client.register_services(services);

    assert!(greeter.binding.is_bound());
    assert!(!impostor.binding.is_bound());
    assert!(client.get_service::<GreeterMarshaller>().is_some());
    assert!(client.get_service::<OtherMarshaller>().is_none());
}

#[test]
fn test_unbound_marshaller_fails_its_listeners() {
    let greeter = GreeterMarshaller::default();
    let rx = greet(&greeter, "nobody");

    assert_eq!(rx.try_recv().unwrap(), Outcome::error(NOT_REGISTERED));
}

#[test]
fn test_clones_share_registry_and_queue() {
    let client = client(RecordingTransport::new(false), false);
    let other = client.clone();
    other.register_service(Arc::new(GreeterMarshaller::default()));

    assert!(client.get_service::<GreeterMarshaller>().is_some());
    other.shutdown(false);
    assert!(client.is_shutdown());
}

// =============================================================================
// Auth Code Tests
// =============================================================================

#[test]
fn test_stored_auth_code_sent() {
    let transport = RecordingTransport::new(true);
    let client = client(transport.clone(), true);
    client.set_auth_code("session-1");
    client.register_service(Arc::new(GreeterMarshaller::default()));

    let (listener, rx) = channel();
    client.require_service::<GreeterMarshaller>().unwrap().whoami(listener);

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Outcome::ok("session-1"));
    assert_eq!(transport.last_call().auth_code(), Some("session-1"));
}

#[test]
fn test_auth_code_ignored_when_disabled() {
    let transport = RecordingTransport::new(false);
    let client = client(transport.clone(), false);
    client.set_auth_code("ignored");

    let (listener, rx) = channel();
    client.send_request(GREETER_ID, 2, vec![Arg::from(listener)]);

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Outcome::Result(Value::Null));
    assert_eq!(transport.last_call().auth_code(), None);
}

#[test]
fn test_auth_code_source_overrides_stored_code() {
    struct PerMethod;

    impl AuthCodeSource for PerMethod {
        fn auth_code(&self, service_id: i32, method_id: i32, args: &[Value]) -> Option<String> {
            Some(format!("{}/{}/{}", service_id, method_id, args.len()))
        }
    }

    let transport = RecordingTransport::new(true);
    let config = ClientConfig::builder().version("v1").use_auth_code(true).build();
    let client = PostClient::builder(config)
        .transport(transport.clone())
        .auth_code_source(Arc::new(PerMethod))
        .build()
        .unwrap();
    client.set_auth_code("unused");

    let (listener, rx) = channel();
    client.send_request(GREETER_ID, 2, vec![Arg::from("a"), Arg::from(listener)]);

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Outcome::ok("3/2/1"));
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_call_carries_version_and_ids() {
    let transport = RecordingTransport::new(false);
    let client = client(transport.clone(), false);

    let (listener, rx) = channel();
    client.send_request(GREETER_ID, 1, vec![Arg::from("bob"), Arg::from(listener)]);
    rx.recv_timeout(WAIT).unwrap();

    let call = transport.last_call();
    assert_eq!(call.version(), Some("v1"));
    assert_eq!(call.service_id(), GREETER_ID);
    assert_eq!(call.method_id(), 1);
    assert_eq!(call.args(), &[Value::from("bob")]);
}
