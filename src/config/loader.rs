//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::env::{apply_env_overrides, parse_env_pairs};
use crate::config::schema::SiteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("Invalid value `{value}` for {key}")]
    EnvValue { key: String, value: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the startup configuration.
///
/// Starts from the TOML file when given (defaults otherwise), then layers
/// `KEY=VALUE` overrides from the env file, then validates the result once.
pub fn load_site_config(
    config_path: Option<&Path>,
    env_path: Option<&Path>,
) -> Result<SiteConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => SiteConfig::default(),
    };

    if let Some(path) = env_path {
        let content = fs::read_to_string(path)?;
        let pairs = parse_env_pairs(&content)?;
        let applied = apply_env_overrides(&mut config, &pairs)?;
        tracing::debug!(path = %path.display(), applied, "Applied env overrides");
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_toml_with_partial_sections() {
        let path = std::env::temp_dir().join(format!("site-forms-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
[server]
bind_address = "127.0.0.1:3000"

[rate_limits.contact]
max_attempts = 2
window_secs = 60

[uploads]
max_size_bytes = 1024
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.rate_limits.contact.max_attempts, 2);
        assert_eq!(config.rate_limits.comment.max_attempts, 3);
        assert_eq!(config.uploads.max_size_bytes, 1024);
        assert_eq!(config.uploads.allowed_extensions.len(), 5);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("site-forms-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[uploads]\nmax_size_bytes = 0\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::UploadSize]);
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_env_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("site-forms-{}.env", uuid::Uuid::new_v4()));
        fs::write(&path, "# uploads\nUPLOAD_MAX_SIZE=2048\nALLOWED_IMAGE_EXTENSIONS=\"png, jpg\"\n")
            .unwrap();

        let config = load_site_config(None, Some(&path)).unwrap();
        assert_eq!(config.uploads.max_size_bytes, 2048);
        assert_eq!(config.uploads.allowed_extensions, vec!["png", "jpg"]);

        fs::remove_file(&path).unwrap_or_default();
    }
}
