//! Memoizing subscription-status store (the cache/broadcast layer).
//!
//! Wraps a status-fetching collaborator with a single-slot cache, in-flight
//! request coalescing, and subscriber notification. At most one status fetch
//! is ever in flight per store instance, regardless of how many concurrent
//! callers ask for a load; everyone coalesced onto the same fetch observes
//! the same outcome.

use crate::client::BillingClient;
use crate::error::{BillingError, Result};
use crate::types::BillingStatus;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Status-fetching collaborator the store wraps
pub type StatusFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<BillingStatus>> + Send + Sync>;

/// Callback invoked with the current cache slot on every fetch settlement
type Subscriber = Arc<dyn Fn(Option<&BillingStatus>) + Send + Sync>;

/// Outcome shared by every caller coalesced onto one fetch
type FetchOutcome = Result<Arc<BillingStatus>>;

/// The in-flight marker: a pending fetch all concurrent callers await
type InflightFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct StoreState {
    cached: Option<Arc<BillingStatus>>,
    inflight: Option<InflightFetch>,
}

struct StoreInner {
    fetcher: StatusFetcher,
    state: Mutex<StoreState>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_subscriber_id: AtomicU64,
}

/// Handle returned by [`BillingStore::subscribe`].
///
/// Call [`unsubscribe`](Subscription::unsubscribe) to deregister the callback;
/// calling it more than once is a no-op. Dropping the handle does NOT
/// deregister - a subscription outlives its handle until explicitly removed.
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Remove the subscribed callback. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.store.upgrade() {
            inner.subscribers.lock().unwrap().remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Memoizing store over a status-fetching collaborator.
///
/// Cloning is cheap and shares the same cache slot, in-flight marker, and
/// subscriber set.
///
/// # Example
/// ```rust,no_run
/// use billing_sdk::{BillingClient, BillingClientOptions, BillingStore};
/// use std::sync::Arc;
///
/// # async fn run() -> billing_sdk::Result<()> {
/// let client = Arc::new(BillingClient::new(
///     "https://api.example.com",
///     BillingClientOptions::default(),
/// )?);
/// let store = BillingStore::from_client(client);
///
/// let _watch = store.subscribe(|status| {
///     println!("billing status changed: {:?}", status);
/// });
///
/// let status = store.get_status().await?;   // fetches
/// let status = store.get_status().await?;   // cached, no network
/// let status = store.refresh().await?;      // fetches again
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BillingStore {
    inner: Arc<StoreInner>,
}

impl BillingStore {
    /// Create a store over a status-fetching closure.
    ///
    /// The closure is invoked once per initiated fetch; its future must be
    /// `Send` because the store drives it on a spawned task so an initiated
    /// fetch always runs to completion. Store methods must therefore be
    /// called from within a Tokio runtime.
    pub fn new<F, Fut>(fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<BillingStatus>> + Send + 'static,
    {
        Self::from_fetcher(Arc::new(move || fetcher().boxed()))
    }

    /// Create a store that fetches through [`BillingClient::get_billing_status`]
    pub fn from_client(client: Arc<BillingClient>) -> Self {
        Self::new(move || {
            let client = client.clone();
            async move { client.get_billing_status().await }
        })
    }

    /// Create a store over an already-boxed fetcher
    pub fn from_fetcher(fetcher: StatusFetcher) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                fetcher,
                state: Mutex::new(StoreState {
                    cached: None,
                    inflight: None,
                }),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(0),
            }),
        }
    }

    /// Get the subscription status, preferring the cache.
    ///
    /// Returns the cached value without network activity when one exists;
    /// otherwise joins the in-flight fetch if one is running, and initiates a
    /// fetch only when there is neither a cached value nor a fetch in flight.
    pub async fn get_status(&self) -> Result<Arc<BillingStatus>> {
        self.load(false).await
    }

    /// Force-fetch the subscription status.
    ///
    /// Bypasses the cache when deciding whether to initiate, but still
    /// coalesces onto a fetch that is already in flight rather than starting
    /// a second one.
    pub async fn refresh(&self) -> Result<Arc<BillingStatus>> {
        self.load(true).await
    }

    /// Current cache slot value, if any. Never triggers network activity.
    pub fn cached_status(&self) -> Option<Arc<BillingStatus>> {
        self.inner.state.lock().unwrap().cached.clone()
    }

    /// Register a callback invoked with the current cache slot every time a
    /// fetch settles (successfully or not). On failure the slot is unchanged,
    /// so the callback sees the pre-existing value or `None`.
    ///
    /// The returned [`Subscription`] deregisters the callback; losing it
    /// leaves the callback subscribed for the lifetime of the store.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&BillingStatus>) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .insert(id, Arc::new(callback));

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    async fn load(&self, force: bool) -> Result<Arc<BillingStatus>> {
        // Check-and-set under the lock, with no await inside: two callers can
        // never both observe "idle" and both initiate.
        let fetch = {
            let mut state = self.inner.state.lock().unwrap();

            if !force {
                if let Some(cached) = &state.cached {
                    tracing::debug!("billing status cache hit");
                    return Ok(cached.clone());
                }
            }

            if let Some(inflight) = &state.inflight {
                tracing::debug!(force, "joining in-flight billing status fetch");
                inflight.clone()
            } else {
                tracing::debug!(force, "initiating billing status fetch");
                let fetch = self.inner.begin_fetch();
                state.inflight = Some(fetch.clone());
                fetch
            }
        };

        fetch.await
    }
}

impl StoreInner {
    /// Transition `idle -> fetching`: spawn the fetch and hand back the shared
    /// pending outcome. The caller stores it as the in-flight marker while
    /// still holding the state lock; the spawned task's settlement path takes
    /// that same lock, so it cannot settle before the marker is in place.
    fn begin_fetch(self: &Arc<Self>) -> InflightFetch {
        let inner = self.clone();

        let task = tokio::spawn(async move {
            let result = (inner.fetcher)().await;

            let (outcome, slot) = {
                let mut state = inner.state.lock().unwrap();
                let outcome = match result {
                    Ok(payload) => {
                        let payload = Arc::new(payload);
                        state.cached = Some(payload.clone());
                        tracing::debug!("billing status fetch settled");
                        Ok(payload)
                    }
                    Err(err) => {
                        // Failure leaves the slot untouched: stale data beats
                        // no data until the caller retries.
                        tracing::warn!(error = %err, "billing status fetch failed");
                        Err(err)
                    }
                };
                state.inflight = None;
                (outcome, state.cached.clone())
            };

            // Lock released before callbacks run, so a subscriber may call
            // back into the store (including unsubscribing itself).
            inner.notify(slot.as_deref());
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(BillingError::internal(format!(
                    "billing status fetch task failed: {err}"
                ))),
            }
        }
        .boxed()
        .shared()
    }

    /// Notify every current subscriber. Iterates a snapshot of the registry,
    /// so callbacks mutating the subscriber set cannot corrupt iteration or
    /// skip/double-notify others.
    fn notify(&self, status: Option<&BillingStatus>) {
        let snapshot: Vec<Subscriber> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers.values().cloned().collect()
        };

        for callback in snapshot {
            callback(status);
        }
    }
}

impl std::fmt::Debug for BillingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().unwrap();
        f.debug_struct("BillingStore")
            .field("cached", &state.cached)
            .field("fetch_in_flight", &state.inflight.is_some())
            .finish()
    }
}
