//! Coordinator configuration.

use serde::{Deserialize, Serialize};

/// Which queued jobs a new request may be coalesced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoalescingPolicy {
    /// Compare against every pending job queued for the scope, and against
    /// the active head while nothing waits behind it. The first equivalent
    /// job in queue order wins.
    #[default]
    AnyQueued,
    /// Compare only against the most recently queued job for the scope.
    ///
    /// Keeps the effective order of requests intact when a scope receives
    /// interleaved kinds, at the cost of fewer merges.
    TailOnly,
}

/// Configuration for a [`super::JobCoordinator`].
///
/// # Examples
///
/// ```
/// use scope_registry::registration::services::{CoalescingPolicy, CoordinatorConfig};
///
/// let config = CoordinatorConfig::default();
/// assert_eq!(config.coalescing, CoalescingPolicy::AnyQueued);
///
/// let strict = CoordinatorConfig::from_json(r#"{"coalescing": "tail_only"}"#)
///     .expect("valid configuration");
/// assert_eq!(strict, CoordinatorConfig::strict_order());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Coalescing policy for new requests.
    pub coalescing: CoalescingPolicy,
}

impl CoordinatorConfig {
    /// Creates a configuration that only coalesces with the queue tail.
    #[must_use]
    pub const fn strict_order() -> Self {
        Self {
            coalescing: CoalescingPolicy::TailOnly,
        }
    }

    /// Parses a configuration from JSON, defaulting absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the document is malformed or names
    /// an unknown policy.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}
