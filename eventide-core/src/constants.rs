//! Cache constants for eventide.
//!
//! Defaults applied when configuration leaves a value unset, and the
//! policy table used by the eventide data-access layer.

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// TTL applied to keys that match no configured prefix, in milliseconds.
pub const DEFAULT_TTL_MS: u64 = 30_000;

/// Whether keys that match no configured prefix are served stale.
pub const DEFAULT_STALE_WHILE_REVALIDATE: bool = false;

// ═══════════════════════════════════════════════════════════════════════════════
// SWEEP
// ═══════════════════════════════════════════════════════════════════════════════

/// Interval between two passes of the expiry sweep, in milliseconds.
/// Independent of any entry's TTL.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Path to a JSON cache configuration file.
pub const ENV_CONFIG_PATH: &str = "EVENTIDE_CACHE_CONFIG";

/// Override for the sweep interval, in milliseconds.
pub const ENV_SWEEP_INTERVAL_MS: &str = "EVENTIDE_CACHE_SWEEP_MS";

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION POLICY TABLE
// ═══════════════════════════════════════════════════════════════════════════════
// Checked in order; the first prefix a key starts with wins. `events:search`
// sits behind `events` and inherits the same policy either way.

/// `(prefix, ttl in milliseconds, stale-while-revalidate)` rules for the
/// eventide key families.
pub const APPLICATION_POLICIES: &[(&str, u64, bool)] = &[
    ("tags", 300_000, false),
    ("organizations", 300_000, false),
    ("organization:", 300_000, false),
    ("events", 120_000, true),
    ("event:", 120_000, true),
    ("events:search", 120_000, true),
    ("users", 120_000, false),
    ("user:", 120_000, false),
    ("support-messages", 120_000, true),
    ("support-message:", 120_000, true),
    ("signups", 60_000, true),
    ("signup:", 60_000, true),
    ("audit-log", 60_000, true),
    ("event-tags:", 60_000, false),
    ("user-follow:", 120_000, false),
    ("metrics:admin", 30_000, false),
    ("metrics:organizer", 30_000, false),
];
