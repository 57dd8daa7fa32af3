//! # Billing SDK
//!
//! Client-side façade for the billing service: authenticated HTTP requests
//! plus a memoizing subscription-status store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billing_sdk::{BillingClient, BillingClientOptions, BillingStore, is_subscription_active};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(BillingClient::new("https://api.example.com", BillingClientOptions {
//!         access_token: Some(Arc::new(|| Some("access-token".into()))),
//!         ..Default::default()
//!     })?);
//!
//!     // The store memoizes the most recent status and coalesces concurrent
//!     // fetches into a single request.
//!     let store = BillingStore::from_client(client.clone());
//!
//!     let _watch = store.subscribe(|status| {
//!         println!("subscription active: {}", is_subscription_active(status));
//!     });
//!
//!     let status = store.get_status().await?;
//!     if !status.is_active() {
//!         println!("subscription inactive");
//!     }
//!
//!     // Direct calls bypass the store.
//!     client.cancel_subscription().await?;
//!     store.refresh().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//!
//! - At most one status fetch is in flight per store instance; concurrent
//!   callers share one request and one outcome.
//! - A failed fetch never clears the cached value and is reported to every
//!   coalesced caller; the store does not retry on its own.
//! - Subscribers are notified with the current cached value on every fetch
//!   settlement, success or failure.
//! - The network sits behind the [`Transport`] trait; tests inject a mock,
//!   production uses the `reqwest`-backed [`HttpTransport`].

pub mod client;
pub mod error;
pub mod store;
pub mod transport;
pub mod types;

// Request layer
pub use client::{AccessTokenProvider, BillingClient, BillingClientOptions};

// Cache/broadcast layer
pub use store::{BillingStore, StatusFetcher, Subscription};

// Error types
pub use error::{map_status_to_error_code, BillingError, BillingErrorCode, Result};

// Transport seam
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

// Types
pub use types::{is_subscription_active, BillingStatus};
