//! Transport
//!
//! One blocking request/response exchange with the server.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::ClientConfig;
use crate::error::{Result, RiposteError};

/// Carries an encoded call to the server and returns the response body
pub trait Transport: Send + Sync {
    fn exchange(&self, body: Vec<u8>) -> Result<Vec<u8>>;
}

/// HTTP POST transport
pub struct HttpTransport {
    client: Client,
    url: String,
    max_response_size: usize,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = match config.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: config.service_address.clone(),
            max_response_size: config.max_payload_size,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn exchange(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RiposteError::Transport(format!(
                "HTTP status {}",
                status.as_u16()
            )));
        }

        let mut bytes = Vec::new();
        response
            .take(self.max_response_size as u64 + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() > self.max_response_size {
            return Err(RiposteError::Transport(format!(
                "Response too large: more than {} bytes",
                self.max_response_size
            )));
        }
        Ok(bytes)
    }
}
