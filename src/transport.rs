use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::OnceLock;
use thiserror::Error;

use crate::client::{create_async_client, create_blocking_client, Config};
use crate::envelope::OAUTH_PROBLEM;

/// Failure below the API envelope: connection, TLS, timeout or HTTP status.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// Response body, when the server answered
    pub body: Option<String>,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Create a transport error from a plain message
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            status: None,
            body: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error for an unexpected HTTP status
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        TransportError {
            status: Some(status),
            body: Some(body.into()),
            message: format!("HTTP status {}", status),
            source: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError {
            status: e.status().map(|s| s.as_u16()),
            body: None,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

/// A multipart POST ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    /// Target URL
    pub url: String,
    /// Headers in sending order
    pub headers: Vec<(String, String)>,
    /// Multipart text fields in sending order
    pub fields: Vec<(String, String)>,
    /// Whether the server certificate must be verified
    pub verify_tls: bool,
}

/// Blocking transport used by synchronous calls
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response body
    fn post(&self, request: &PostRequest) -> Result<String, TransportError>;
}

/// Non-blocking transport used by asynchronous calls.
///
/// Dropping the returned future must abandon the request.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Send the request and return the raw response body
    async fn post(&self, request: &PostRequest) -> Result<String, TransportError>;
}

/// Keep the body for the envelope codec unless the status is an error that
/// the codec cannot explain.
fn check_status(status: StatusCode, body: String) -> Result<String, TransportError> {
    if status.is_success() || body.contains(OAUTH_PROBLEM) {
        Ok(body)
    } else {
        Err(TransportError::status(status.as_u16(), body))
    }
}

/// Pair of HTTP clients, with and without certificate verification
struct ClientPair<C> {
    verified: C,
    unverified: C,
}

impl<C> ClientPair<C> {
    fn get(&self, verify_tls: bool) -> &C {
        if verify_tls {
            &self.verified
        } else {
            &self.unverified
        }
    }
}

/// Blocking transport backed by `reqwest::blocking`.
///
/// Clients are built on first use, so the transport can be created from
/// inside an async runtime as long as it is only used outside of it.
pub struct ReqwestTransport {
    config: Config,
    clients: OnceLock<ClientPair<reqwest::blocking::Client>>,
}

impl ReqwestTransport {
    pub fn new(config: Config) -> Self {
        ReqwestTransport {
            config,
            clients: OnceLock::new(),
        }
    }

    fn client(&self, verify_tls: bool) -> Result<&reqwest::blocking::Client, TransportError> {
        if let Some(pair) = self.clients.get() {
            return Ok(pair.get(verify_tls));
        }
        let pair = ClientPair {
            verified: create_blocking_client(&self.config, true)?,
            unverified: create_blocking_client(&self.config, false)?,
        };
        Ok(self.clients.get_or_init(|| pair).get(verify_tls))
    }
}

impl Transport for ReqwestTransport {
    fn post(&self, request: &PostRequest) -> Result<String, TransportError> {
        let mut form = reqwest::blocking::multipart::Form::new();
        for (name, value) in &request.fields {
            form = form.text(name.clone(), value.clone());
        }

        let mut builder = self.client(request.verify_tls)?.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        check_status(status, body)
    }
}

/// Async transport backed by `reqwest`
pub struct AsyncReqwestTransport {
    config: Config,
    clients: OnceLock<ClientPair<reqwest::Client>>,
}

impl AsyncReqwestTransport {
    pub fn new(config: Config) -> Self {
        AsyncReqwestTransport {
            config,
            clients: OnceLock::new(),
        }
    }

    fn client(&self, verify_tls: bool) -> Result<&reqwest::Client, TransportError> {
        if let Some(pair) = self.clients.get() {
            return Ok(pair.get(verify_tls));
        }
        let pair = ClientPair {
            verified: create_async_client(&self.config, true)?,
            unverified: create_async_client(&self.config, false)?,
        };
        Ok(self.clients.get_or_init(|| pair).get(verify_tls))
    }
}

#[async_trait]
impl AsyncTransport for AsyncReqwestTransport {
    async fn post(&self, request: &PostRequest) -> Result<String, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &request.fields {
            form = form.text(name.clone(), value.clone());
        }

        let mut builder = self.client(request.verify_tls)?.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert_eq!(check_status(StatusCode::OK, "{}".to_string()).unwrap(), "{}");

        let err = check_status(StatusCode::BAD_GATEWAY, "down".to_string()).unwrap_err();
        assert_eq!(err.status, Some(502));
        assert_eq!(err.body.as_deref(), Some("down"));
        assert_eq!(err.to_string(), "HTTP status 502");
    }

    #[test]
    fn test_oauth_problem_passes_through() {
        let body = "oauth_problem=signature_invalid".to_string();
        assert_eq!(check_status(StatusCode::UNAUTHORIZED, body.clone()).unwrap(), body);
    }
}
