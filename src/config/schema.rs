//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the site.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Server configuration (bind address, timeouts).
    pub server: ServerConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Per-form rate limits.
    pub rate_limits: RateLimitsConfig,

    /// Image upload constraints.
    pub uploads: UploadConfig,

    /// Persistence backend.
    pub database: DatabaseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin surface settings.
    pub admin: AdminConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Package comparison settings.
    pub packages: PackagesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Only send the session cookie over HTTPS.
    pub secure_cookie: bool,

    /// Inactivity period after which a session expires, in seconds.
    pub inactivity_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookie: false,
            inactivity_secs: 24 * 3600,
        }
    }
}

/// A fixed-window limit: `max_attempts` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitRule {
    /// Allowed actions per window.
    pub max_attempts: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitRule {
    pub const fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window_secs,
        }
    }
}

/// Rate limits per form action.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub contact: RateLimitRule,
    pub comment: RateLimitRule,
    pub plan_selection: RateLimitRule,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            contact: RateLimitRule::new(5, 300),
            comment: RateLimitRule::new(3, 300),
            plan_selection: RateLimitRule::new(5, 300),
        }
    }
}

/// Image upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Managed upload directory (created on demand).
    pub directory: String,

    /// Maximum accepted file size in bytes.
    pub max_size_bytes: u64,

    /// Lower-case extensions accepted for images.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: "uploads".to_string(),
            max_size_bytes: 5 * 1024 * 1024, // 5MB
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL. In-memory repository when unset.
    pub url: Option<String>,

    /// Seed the in-memory repository with demo articles and packages.
    pub seed_demo_content: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Path of the append-only security log.
    pub security_log_path: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            security_log_path: "logs/security.log".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin upload route.
    pub enabled: bool,

    /// API key for authentication (Bearer token). Required when enabled.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum form body size in bytes (uploads use `uploads.max_size_bytes`).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Package comparison configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Feature keywords, one comparison row each.
    pub comparison_keywords: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            comparison_keywords: [
                "cement", "steel", "bricks", "flooring", "kitchen", "bathroom", "doors",
                "windows", "painting", "electrical", "plumbing",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
