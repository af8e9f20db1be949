//! Call definitions
//!
//! One fully specified invocation, as written by the client.

use super::Value;

/// A service call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    version: Option<String>,
    auth_code: Option<String>,
    service_id: i32,
    method_id: i32,
    args: Vec<Value>,
}

impl Call {
    /// Create an unversioned call without an auth code
    pub fn new(service_id: i32, method_id: i32, args: Vec<Value>) -> Self {
        Self {
            version: None,
            auth_code: None,
            service_id,
            method_id,
            args,
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_auth_code(mut self, auth_code: Option<String>) -> Self {
        self.auth_code = auth_code;
        self
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn auth_code(&self) -> Option<&str> {
        self.auth_code.as_deref()
    }

    pub fn service_id(&self) -> i32 {
        self.service_id
    }

    pub fn method_id(&self) -> i32 {
        self.method_id
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
