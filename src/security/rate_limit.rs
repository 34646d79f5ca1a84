//! Session-scoped fixed-window rate limiting.
//!
//! Counters live in [`SessionState`] and are keyed by action and client
//! address. A window opens on the first attempt and resets once more than
//! `window_secs` have passed since it opened; bursts of up to twice the
//! limit across a window boundary are expected.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::RateLimitRule;
use crate::observability::metrics;
use crate::security::session::{RateLimitRecord, SessionState};

/// Source of the current time in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Counter key for an action performed by a client.
pub fn rate_limit_key(action: &str, client: IpAddr) -> String {
    format!("{action}:{client}")
}

/// Fixed-window limiter operating on a session's counters.
#[derive(Clone)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Record an attempt for `key` if the limit allows it.
    ///
    /// Returns `false` without counting when the window is already full.
    pub fn check_and_consume(&self, state: &mut SessionState, key: &str, rule: RateLimitRule) -> bool {
        let now = self.clock.now();
        let record = state
            .rate_limits
            .entry(key.to_string())
            .or_insert(RateLimitRecord {
                attempts: 0,
                window_start: now,
            });

        if record.attempts == 0 || now.saturating_sub(record.window_start) > rule.window_secs {
            *record = RateLimitRecord {
                attempts: 1,
                window_start: now,
            };
            return true;
        }

        if record.attempts < rule.max_attempts {
            record.attempts += 1;
            true
        } else {
            tracing::debug!(key, attempts = record.attempts, "Rate limit window full");
            metrics::record_rate_limited(key.split(':').next().unwrap_or(key));
            false
        }
    }

    /// Seconds until the window for `key` closes; zero without a record.
    pub fn remaining_cooldown(&self, state: &SessionState, key: &str, window_secs: u64) -> u64 {
        state
            .rate_limits
            .get(key)
            .map(|record| {
                let elapsed = self.clock.now().saturating_sub(record.window_start);
                window_secs.saturating_sub(elapsed)
            })
            .unwrap_or(0)
    }
}

/// Whole minutes to tell the user to wait, rounded up.
pub fn cooldown_minutes(remaining_secs: u64) -> u64 {
    remaining_secs.div_ceil(60)
}
