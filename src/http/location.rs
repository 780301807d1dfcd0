//! Parsed request targets.
//!
//! # Responsibilities
//! - Split an address like `post://host:8080/path?x=1` into scheme, host,
//!   port and service
//! - Render the `Host` header value and the absolute-form endpoint
//!
//! # Design Decisions
//! - The `url` crate only validates; host, port and service come from the
//!   address text, so every scheme family renders the same target bytes
//! - `service` is everything after the first `/` of the path, query included,
//!   with no dot-segment removal or percent-encoding
//! - An explicit port is kept even when it is the scheme default

use url::Url;

use crate::http::error::RequestError;

/// The structured form of a message address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLocation {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub service: String,
}

impl ParsedLocation {
    /// Parse an address.
    ///
    /// The `url` crate validates the address; host, port and service are then
    /// sliced from the text as written, so no normalization reaches the wire.
    pub fn parse(addr: &str) -> Result<Self, RequestError> {
        let invalid = |reason: &str| RequestError::InvalidLocation {
            addr: addr.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(addr).map_err(|e| invalid(&e.to_string()))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        let (_, rest) = addr.split_once("://").ok_or_else(|| invalid("missing host"))?;

        let (authority, service) = match rest.find(['/', '?']) {
            Some(i) if rest.as_bytes()[i] == b'/' => (&rest[..i], &rest[i + 1..]),
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let authority = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);

        // An IPv6 literal keeps its colons inside the brackets.
        let (host, port) = match authority.rfind(':') {
            Some(i) if !authority[i..].contains(']') => (&authority[..i], &authority[i + 1..]),
            _ => (authority, ""),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = if port.is_empty() {
            None
        } else {
            Some(port.parse::<u16>().map_err(|_| invalid("invalid port"))?)
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
            service: service.to_string(),
        })
    }

    /// Build a location from its parts.
    pub fn new(scheme: &str, host: &str, port: Option<u16>, service: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            service: service.to_string(),
        }
    }

    /// `host[:port]`, as written in the `Host` header.
    pub fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Upper bound on the bytes `:port` can take.
    pub(crate) fn port_len(&self) -> usize {
        if self.port.is_some() { 6 } else { 0 }
    }
}
