//! HTTP transport for the TSML client.
//!
//! The client talks to the site through the [`Transport`] trait so the
//! request logic can be exercised without a network.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("pdf12step/", env!("CARGO_PKG_VERSION"));

const TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Query parameters go in the URL.
    Get,
    /// Parameters go in a form-encoded body.
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Query or form parameters, in order.
    pub params: Vec<(String, String)>,
}

impl Request {
    /// A GET request with query parameters.
    #[must_use]
    pub fn get(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params,
        }
    }

    /// A POST request with form parameters.
    #[must_use]
    pub fn post(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params,
        }
    }

    /// Value of a parameter, if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Response {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests on behalf of the client.
pub trait Transport {
    /// Send a request and return the status and body.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or the body not read.
    fn send(&self, request: &Request) -> Result<Response>;
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a transport with the crate's user agent and a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => self.client.post(&request.url).form(&request.params),
        };
        let response = builder.send()?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or_default().to_string())
            .unwrap_or_default();
        let body = response.text()?;
        debug!(
            "GOT {status} {}B {content_type} from {}",
            body.len(),
            request.url
        );
        Ok(Response { status, body })
    }
}
