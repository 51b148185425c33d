//! Policy types shared by the cache and its configuration.
//!
//! - [`CachePolicy`]: how long a value stays fresh and what happens after
//! - [`PolicyRule`]: a policy attached to every key sharing a prefix

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_STALE_WHILE_REVALIDATE, DEFAULT_TTL_MS};

/// Identifies a cached value.
///
/// Keys follow a `prefix[:suffix]` convention (`events`, `event:42`,
/// `events:search?q=park`) but the cache treats them as flat strings.
pub type CacheKey = String;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Freshness policy for a family of keys.
///
/// Serialized with the TTL in milliseconds:
///
/// ```json
/// { "ttl_ms": 120000, "stale_while_revalidate": true }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Age after which a stored value is expired
    #[serde(rename = "ttl_ms", with = "duration_ms")]
    pub ttl: Duration,
    /// Serve expired values while a background refresh runs
    #[serde(default)]
    pub stale_while_revalidate: bool,
}

impl CachePolicy {
    /// Creates a policy.
    pub const fn new(ttl: Duration, stale_while_revalidate: bool) -> Self {
        Self {
            ttl,
            stale_while_revalidate,
        }
    }

    /// Creates a policy from a TTL in milliseconds.
    pub const fn from_millis(ttl_ms: u64, stale_while_revalidate: bool) -> Self {
        Self::new(Duration::from_millis(ttl_ms), stale_while_revalidate)
    }

    /// Returns true if a value of the given age is past its TTL.
    pub fn is_expired(&self, age: Duration) -> bool {
        age >= self.ttl
    }
}

impl Default for CachePolicy {
    /// 30 seconds, no stale-while-revalidate.
    fn default() -> Self {
        Self::from_millis(DEFAULT_TTL_MS, DEFAULT_STALE_WHILE_REVALIDATE)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POLICY RULE
// ═══════════════════════════════════════════════════════════════════════════════

/// A policy bound to every key starting with `prefix`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Leading substring a key must start with
    pub prefix: String,
    /// Policy applied on match
    #[serde(flatten)]
    pub policy: CachePolicy,
}

impl PolicyRule {
    /// Creates a rule.
    pub fn new(prefix: impl Into<String>, policy: CachePolicy) -> Self {
        Self {
            prefix: prefix.into(),
            policy,
        }
    }

    /// Returns true if `key` falls under this rule.
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
