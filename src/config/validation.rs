//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject values that would corrupt the wire format
//! - Flag suspicious but accepted values as warnings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Inverted soft/hard limits are a warning, not an error: the delta floors
//!   at 0 and the pair is kept as configured

use crate::config::schema::TransportConfig;

/// A configuration value that cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A configuration value that is accepted but probably unintended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Validate a configuration, returning its warnings or every error found.
pub fn validate_config(config: &TransportConfig) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if has_line_break(&config.request.default_content_type) {
        errors.push(ValidationError {
            field: "request.default_content_type",
            message: "must not contain CR or LF".to_string(),
        });
    }

    let log_level = config.observability.log_level.trim();
    if log_level.is_empty() {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: "must not be empty".to_string(),
        });
    } else if has_line_break(log_level) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: "must not contain CR or LF".to_string(),
        });
    }

    if config.limits.is_inverted() {
        warnings.push(ValidationWarning {
            field: "limits",
            message: format!(
                "soft limit {} exceeds hard limit {}; overflow band is 0",
                config.limits.soft, config.limits.hard
            ),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::limits::ConnectionLimits;

    #[test]
    fn default_config_is_clean() {
        assert_eq!(validate_config(&TransportConfig::default()), Ok(Vec::new()));
    }

    #[test]
    fn inverted_limits_warn() {
        let mut config = TransportConfig::default();
        config.limits = ConnectionLimits { soft: 10_000, hard: 8_000 };
        let warnings = validate_config(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "limits");
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TransportConfig::default();
        config.request.default_content_type = "text/plain\r\nX-Injected: 1".to_string();
        config.observability.log_level = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "request.default_content_type: must not contain CR or LF");
    }
}
