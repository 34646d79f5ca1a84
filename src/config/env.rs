//! `KEY=VALUE` environment file support.
//!
//! Deployments keep their secrets and per-host knobs in a `.env` file. The
//! pairs are parsed once at startup and folded into [`SiteConfig`]; nothing
//! reads the process environment after that.

use std::collections::HashMap;
use std::str::FromStr;

use crate::config::loader::ConfigError;
use crate::config::schema::SiteConfig;

/// Parse `KEY=VALUE` lines. Comments, blank lines and quoting follow dotenv rules.
pub fn parse_env_pairs(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut pairs = HashMap::new();
    for item in dotenvy::from_read_iter(content.as_bytes()) {
        let (key, value) = item?;
        pairs.insert(key, value);
    }
    Ok(pairs)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Apply recognised keys onto `config`. Returns how many keys were applied.
///
/// Unknown keys are ignored so the same file can carry settings for other tools.
pub fn apply_env_overrides(
    config: &mut SiteConfig,
    pairs: &HashMap<String, String>,
) -> Result<usize, ConfigError> {
    let mut applied = 0;
    for (key, value) in pairs {
        let recognised = match key.as_str() {
            "BIND_ADDRESS" => {
                config.server.bind_address = value.trim().to_string();
                true
            }
            "REQUEST_TIMEOUT" => {
                config.server.request_timeout_secs = parse_value(key, value)?;
                true
            }
            "SESSION_SECURE_COOKIE" => {
                config.session.secure_cookie = parse_bool(key, value)?;
                true
            }
            "UPLOAD_DIR" => {
                config.uploads.directory = value.trim().to_string();
                true
            }
            "UPLOAD_MAX_SIZE" => {
                config.uploads.max_size_bytes = parse_value(key, value)?;
                true
            }
            "ALLOWED_IMAGE_EXTENSIONS" => {
                config.uploads.allowed_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect();
                true
            }
            "DATABASE_URL" => {
                let url = value.trim();
                config.database.url = (!url.is_empty()).then(|| url.to_string());
                true
            }
            "CONTACT_RATE_LIMIT" => {
                config.rate_limits.contact.max_attempts = parse_value(key, value)?;
                true
            }
            "CONTACT_RATE_WINDOW" => {
                config.rate_limits.contact.window_secs = parse_value(key, value)?;
                true
            }
            "COMMENT_RATE_LIMIT" => {
                config.rate_limits.comment.max_attempts = parse_value(key, value)?;
                true
            }
            "COMMENT_RATE_WINDOW" => {
                config.rate_limits.comment.window_secs = parse_value(key, value)?;
                true
            }
            "PLAN_RATE_LIMIT" => {
                config.rate_limits.plan_selection.max_attempts = parse_value(key, value)?;
                true
            }
            "PLAN_RATE_WINDOW" => {
                config.rate_limits.plan_selection.window_secs = parse_value(key, value)?;
                true
            }
            "ADMIN_API_KEY" => {
                config.admin.api_key = value.clone();
                config.admin.enabled = !value.trim().is_empty();
                true
            }
            "SECURITY_LOG_PATH" => {
                config.observability.security_log_path = value.trim().to_string();
                true
            }
            "LOG_LEVEL" => {
                config.observability.log_level = value.trim().to_ascii_lowercase();
                true
            }
            _ => false,
        };
        if recognised {
            applied += 1;
        }
    }
    Ok(applied)
}
