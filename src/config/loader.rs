//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::TransportConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Parse and validate configuration from TOML text.
///
/// Validation warnings are logged and do not fail the load.
pub fn parse_config(content: &str) -> Result<TransportConfig, ConfigError> {
    let config: TransportConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    let warnings = validate_config(&config).map_err(ConfigError::Validation)?;
    for warning in &warnings {
        tracing::warn!(field = warning.field, "Configuration warning: {}", warning.message);
    }

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TransportConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content)?;

    tracing::info!(
        path = %path.display(),
        soft_limit = config.limits.soft,
        hard_limit = config.limits.hard,
        "Configuration loaded"
    );
    Ok(config)
}
