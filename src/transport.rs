//! Pluggable HTTP transport.
//!
//! The client talks to the billing service through the [`Transport`] trait so
//! tests (and embedders with their own HTTP stack) can swap the network out.
//! [`HttpTransport`] is the default implementation over `reqwest`.

use crate::error::{BillingError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// A single outbound request, already fully built by the client.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Header name/value pairs, in insertion order
    pub headers: Vec<(String, String)>,
    /// JSON request body, if any
    pub body: Option<Value>,
}

/// Transport-level view of a response: the status and the parsed JSON body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body (`Value::Null` when a failure response had no JSON body)
    pub body: Value,
}

impl TransportResponse {
    /// Whether the status is in the success range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam between [`crate::BillingClient`] and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request, returning the response or a network error.
    ///
    /// Non-success HTTP statuses are NOT errors at this layer; they come back
    /// as a [`TransportResponse`] and the client decides how to surface them.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Default transport backed by a shared `reqwest` client
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the SDK's default `reqwest` client
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("billing-sdk-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BillingError::network(e.to_string()))?;

        Ok(Self { http })
    }

    /// Create a transport over an existing `reqwest` client
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        let status = response.status().as_u16();

        let body = if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| BillingError::network(e.to_string()))?
        } else {
            // Failure bodies are best-effort: the service usually sends
            // {error, details} but proxies may send HTML or nothing.
            response.json().await.unwrap_or(Value::Null)
        };

        Ok(TransportResponse { status, body })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}
