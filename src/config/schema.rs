//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::normalize::{RequestFlags, RequestOptions, RequestType, DEFAULT_CONTENT_TYPE};
use crate::net::limits::ConnectionLimits;

/// Root configuration for the transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection soft/hard limits.
    pub limits: ConnectionLimits,

    /// Defaults for full-request normalization.
    pub request: RequestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Defaults applied when rewriting messages into full requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RequestConfig {
    /// Content type sent with non-empty content.
    pub default_content_type: String,

    /// Method to use when the caller does not pick one.
    pub request_type: RequestType,

    /// Write request targets in absolute form (for proxies).
    pub absolute_uri: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            request_type: RequestType::Any,
            absolute_uri: false,
        }
    }
}

impl RequestConfig {
    /// Normalization options seeded from this configuration.
    pub fn options(&self) -> RequestOptions<'_> {
        let flags = if self.absolute_uri {
            RequestFlags::ABSOLUTE_URI
        } else {
            RequestFlags::NONE
        };
        RequestOptions::new()
            .content_type(&self.default_content_type)
            .request_type(self.request_type)
            .flags(flags)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
