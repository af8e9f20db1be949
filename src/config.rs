//! Configuration for Riposte
//!
//! Centralized configuration with sensible defaults. Server and client carry
//! separate configs, but the version string and the auth-code switch must
//! agree between the two sides of a deployment.

/// Hard ceiling on a request or response body (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Server-side configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Version every call must carry. `None` only accepts calls that also
    /// carry no version.
    pub client_version: Option<String>,

    /// Whether calls carry an auth code after the version string
    pub use_auth_code: bool,

    /// Largest accepted request body (in bytes)
    pub max_payload_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Route that accepts calls
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client_version: None,
            use_auth_code: false,
            max_payload_size: MAX_PAYLOAD_SIZE,
            listen_addr: "127.0.0.1:8080".to_string(),
            path: "/riposte".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the version clients must send
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.config.client_version = Some(version.into());
        self
    }

    /// Enable or disable auth-code streaming
    pub fn use_auth_code(mut self, enabled: bool) -> Self {
        self.config.use_auth_code = enabled;
        self
    }

    /// Set the maximum request body size (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the route calls are posted to
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

/// Client-side configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fully qualified URL calls are posted to
    pub service_address: String,

    /// Version sent with every call
    pub version: Option<String>,

    /// Whether an auth code is streamed after the version
    pub use_auth_code: bool,

    /// Per-exchange timeout (milliseconds). 0 waits forever.
    pub request_timeout_ms: u64,

    /// Largest accepted response body (in bytes)
    pub max_payload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_address: "http://127.0.0.1:8080/riposte".to_string(),
            version: None,
            use_auth_code: false,
            request_timeout_ms: 0,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the URL calls are posted to
    pub fn service_address(mut self, url: impl Into<String>) -> Self {
        self.config.service_address = url.into();
        self
    }

    /// Set the version string sent with each call
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = Some(version.into());
        self
    }

    /// Enable or disable auth-code streaming
    pub fn use_auth_code(mut self, enabled: bool) -> Self {
        self.config.use_auth_code = enabled;
        self
    }

    /// Set the exchange timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    /// Set the maximum response body size (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
