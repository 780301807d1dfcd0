//! Logical outgoing messages.

use crate::http::error::RequestError;
use crate::http::location::ParsedLocation;

/// A message as handed to the transport: target address plus raw data.
///
/// What `data` means depends on the scheme: the query string for `http`,
/// the body for `post`, the complete wire request for `full`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub addr: String,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(addr: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            addr: addr.into(),
            data: data.into(),
        }
    }

    /// Scheme of the address, lowercased, without parsing the rest.
    pub fn scheme(&self) -> String {
        self.addr
            .split_once(':')
            .map_or_else(String::new, |(scheme, _)| scheme.to_ascii_lowercase())
    }

    /// Parse the address.
    pub fn location(&self) -> Result<ParsedLocation, RequestError> {
        ParsedLocation::parse(&self.addr)
    }
}
