//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits and windows > 0, sizes > 0)
//! - Check that allowed upload extensions are image types we can detect
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RateLimitRule, SiteConfig};
use crate::security::upload::ImageType;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),
    #[error("rate limit `{0}` must allow at least one attempt in a non-empty window")]
    RateLimit(&'static str),
    #[error("upload size limit must be greater than zero")]
    UploadSize,
    #[error("at least one upload extension must be allowed")]
    NoExtensions,
    #[error("upload extension `{0}` is not a supported image type")]
    UnsupportedExtension(String),
    #[error("request timeout must be greater than zero")]
    Timeout,
    #[error("admin is enabled but the API key is empty or a known placeholder")]
    AdminKey,
}

/// Sample keys that circulate in example configs and must never guard the admin route.
const PLACEHOLDER_ADMIN_KEYS: &[&str] = &["CHANGE_ME_IN_PRODUCTION", "changeme", "change-me"];

fn admin_key_is_usable(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty()
        && !PLACEHOLDER_ADMIN_KEYS
            .iter()
            .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Timeout);
    }

    let rules = [
        ("contact", config.rate_limits.contact),
        ("comment", config.rate_limits.comment),
        ("plan_selection", config.rate_limits.plan_selection),
    ];
    for (name, rule) in rules {
        if !rule_is_usable(rule) {
            errors.push(ValidationError::RateLimit(name));
        }
    }

    if config.uploads.max_size_bytes == 0 {
        errors.push(ValidationError::UploadSize);
    }
    if config.uploads.allowed_extensions.is_empty() {
        errors.push(ValidationError::NoExtensions);
    }
    for ext in &config.uploads.allowed_extensions {
        if ImageType::from_extension(ext).is_none() {
            errors.push(ValidationError::UnsupportedExtension(ext.clone()));
        }
    }

    if config.admin.enabled && !admin_key_is_usable(&config.admin.api_key) {
        errors.push(ValidationError::AdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn rule_is_usable(rule: RateLimitRule) -> bool {
    rule.max_attempts > 0 && rule.window_secs > 0
}
