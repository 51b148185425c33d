//! # eventide Cache
//!
//! In-memory response cache that sits in front of every network read of
//! the eventide data-access layer.
//!
//! ## Features
//!
//! - **Prefix policies**: TTL and stale-while-revalidate chosen per key family
//! - **Stale-while-revalidate**: expired values are served while a background
//!   refresh runs, with at most one refresh in flight per key
//! - **Invalidation**: by exact key, by prefix, or everything at once
//! - **Sweep**: a periodic task drops expired entries that no refresh is about
//!   to replace
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use eventide_cache::{CacheConfig, CacheManager};
//!
//! let cache = CacheManager::new(
//!     CacheConfig::default().with_rule("events", Duration::from_secs(120), true),
//! )?;
//!
//! let events = cache
//!     .get_or_fetch("events:all", || async { api.list_events().await })
//!     .await?;
//!
//! // After creating an event, list and detail caches are both stale.
//! cache.invalidate_pattern("event");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod manager;
mod policy;
mod stats;
mod store;
mod sweep;
mod tracker;

pub use eventide_core::{CacheConfig, CacheError, CacheKey, CachePolicy, PolicyRule, Result};
pub use manager::{CacheManager, CacheRead, Freshness};
pub use policy::PolicyResolver;
pub use stats::CacheStats;
pub use store::{CacheEntry, EntryStore};
pub use sweep::SweepTask;
pub use tracker::RevalidationTracker;
