//! Per-session security state.
//!
//! The CSRF token and the rate-limit counters live in one serializable
//! struct stored under a single session key. Handlers load it at the start
//! of a request, hand `&mut SessionState` to the CSRF manager and the rate
//! limiter, and write it back before redirecting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key holding the serialized [`SessionState`].
pub const SESSION_STATE_KEY: &str = "security";

/// One fixed-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    /// Actions allowed so far in the current window.
    pub attempts: u32,
    /// Window start, seconds since the Unix epoch.
    pub window_start: u64,
}

/// Security state attached to a server-side session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Opaque per-session CSRF secret, issued lazily.
    pub csrf_token: Option<String>,
    /// Rate-limit counters keyed by `action:client`.
    pub rate_limits: HashMap<String, RateLimitRecord>,
}

impl SessionState {
    /// Load the state from the session, starting empty when absent.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<SessionState>(SESSION_STATE_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Write the state back to the session.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(SESSION_STATE_KEY, self).await
    }
}
