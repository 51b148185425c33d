//! # eventide Core
//!
//! Shared building blocks for the eventide response cache.
//!
//! - **Types**: cache policies and prefix rules
//! - **Config**: the policy table, sweep interval, and how they are loaded
//! - **Errors**: failures that belong to the cache itself
//! - **Constants**: defaults and the application policy table
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use eventide_core::CacheConfig;
//!
//! let config = CacheConfig::default()
//!     .with_rule("events", Duration::from_secs(120), true)
//!     .with_rule("tags", Duration::from_secs(300), false);
//! assert_eq!(config.rules.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::CacheConfig;
pub use constants::*;
pub use error::{CacheError, Result};
pub use types::{CacheKey, CachePolicy, PolicyRule};
