//! Type definitions for the billing SDK

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subscription status payload returned by the billing service.
///
/// The billing service owns the shape of this payload; the SDK only ever
/// interprets the `status` field. Everything else is carried through verbatim
/// in `extra` so callers can read service-specific fields without an SDK
/// update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingStatus {
    /// Subscription state as reported by the service ("active", "canceled", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// All other payload fields, uninterpreted
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BillingStatus {
    /// Whether this payload reports an active subscription.
    ///
    /// Exact, case-sensitive comparison against `"active"` - no trimming, no
    /// synonym handling.
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }

    /// Read an uninterpreted payload field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Whether a (possibly absent) status payload reports an active subscription.
///
/// Returns `false` for an absent payload, a payload with no `status` field,
/// and any value other than exactly `"active"`.
pub fn is_subscription_active(status: Option<&BillingStatus>) -> bool {
    status.map(BillingStatus::is_active).unwrap_or(false)
}
