//! Billing service client (the request layer)

use crate::error::{BillingError, Result};
use crate::transport::{HttpTransport, Transport, TransportRequest};
use crate::types::BillingStatus;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Supplies the current access token, or `None` when the caller is
/// unauthenticated. Token acquisition and refresh are entirely the caller's
/// concern; the client just reads whatever the provider returns at request
/// time.
pub type AccessTokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Configuration options for [`BillingClient`]
#[derive(Clone, Default)]
pub struct BillingClientOptions {
    /// Access-token provider (default: no Authorization header)
    pub access_token: Option<AccessTokenProvider>,
    /// Custom transport (default: [`HttpTransport`])
    pub transport: Option<Arc<dyn Transport>>,
}

impl std::fmt::Debug for BillingClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingClientOptions")
            .field("access_token", &self.access_token.as_ref().map(|_| "<provider>"))
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .finish()
    }
}

/// Client for the billing endpoints of the service API.
///
/// Builds absolute URLs from a configured base, attaches JSON and bearer-auth
/// headers, and surfaces non-success responses as [`BillingError`]s.
///
/// # Example
/// ```rust,no_run
/// use billing_sdk::{BillingClient, BillingClientOptions};
///
/// # async fn run() -> billing_sdk::Result<()> {
/// let client = BillingClient::new("https://api.example.com", BillingClientOptions {
///     access_token: Some(std::sync::Arc::new(|| Some("token".to_string()))),
///     ..Default::default()
/// })?;
///
/// let status = client.get_billing_status().await?;
/// println!("active: {}", status.is_active());
/// # Ok(())
/// # }
/// ```
pub struct BillingClient {
    base_url: String,
    access_token: Option<AccessTokenProvider>,
    transport: Arc<dyn Transport>,
}

impl BillingClient {
    /// Create a new billing client.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL of the service API (required)
    /// * `options` - Optional configuration
    ///
    /// Fails with a configuration error when `base_url` is empty or not a
    /// valid absolute URL.
    pub fn new(base_url: &str, options: BillingClientOptions) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(BillingError::config("base_url is required"));
        }

        Url::parse(base_url)
            .map_err(|e| BillingError::config(format!("invalid base_url: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();

        let transport: Arc<dyn Transport> = match options.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };

        Ok(Self {
            base_url,
            access_token: options.access_token,
            transport,
        })
    }

    /// Fetch the current subscription status.
    ///
    /// GET `/system/billing`
    pub async fn get_billing_status(&self) -> Result<BillingStatus> {
        self.request(Method::GET, "/system/billing", &[]).await
    }

    /// Cancel the current subscription.
    ///
    /// POST `/system/billing/cancel`. Returns the service's response body
    /// verbatim; its shape is owned by the service.
    pub async fn cancel_subscription(&self) -> Result<Value> {
        self.request(Method::POST, "/system/billing/cancel", &[])
            .await
    }

    // ==================== Internal Helpers ====================

    /// Join the configured base URL with a path, injecting the leading slash
    /// when missing. Plain concatenation, no query handling.
    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Default headers plus per-request extras; extras override the defaults
    /// on (case-insensitive) name collision.
    fn build_headers(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> =
            vec![("Content-Type".to_string(), "application/json".to_string())];

        let token = self.access_token.as_ref().and_then(|provider| provider());
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        for (name, value) in extra {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.to_string(), value.to_string()));
        }

        headers
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!(method = %method, url = %url, "billing request");

        let response = self
            .transport
            .send(TransportRequest {
                method,
                url,
                headers: self.build_headers(extra_headers),
                body: None,
            })
            .await?;

        if !response.ok() {
            #[derive(Deserialize, Default)]
            struct ErrorBody {
                error: Option<String>,
                details: Option<String>,
            }

            let body: ErrorBody = serde_json::from_value(response.body).unwrap_or_default();
            let message = match (body.error, body.details) {
                (Some(error), Some(details)) => format!("{error}: {details}"),
                (Some(error), None) => error,
                (None, Some(details)) => details,
                (None, None) => format!("billing request failed: {}", response.status),
            };

            tracing::warn!(status = response.status, %message, "billing request failed");
            return Err(BillingError::request(response.status, message));
        }

        serde_json::from_value(response.body).map_err(|e| BillingError::network(e.to_string()))
    }
}

impl std::fmt::Debug for BillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
