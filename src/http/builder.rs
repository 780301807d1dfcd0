//! Request construction strategies.
//!
//! # Responsibilities
//! - GET: query data appended to the request line
//! - POST: header block in scratch, payload borrowed as a second fragment
//! - FULL: payload is already a complete request and goes out untouched
//! - Pick a strategy from a scheme name
//!
//! # Design Decisions
//! - Builders are stateless; `build` is safe to call from any thread
//! - Scratch space is an upper-bound estimate of the head size; running past
//!   it is reported as `ScratchOverflow` and means the estimate is wrong
//! - Builders trust their input: a malformed location yields a malformed
//!   request, not an error

use crate::http::error::RequestError;
use crate::http::location::ParsedLocation;
use crate::http::message::Message;
use crate::http::request::{RequestData, ScratchWriter};
use crate::observability::metrics;

/// A strategy that turns a message into wire fragments.
pub trait BuildRequest {
    /// Scheme name this strategy is registered under.
    const NAME: &'static str;

    fn build<'a>(msg: &'a Message, loc: &ParsedLocation) -> Result<RequestData<'a>, RequestError>;
}

/// `GET /<service>[?<data>] HTTP/1.1`
#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

/// `POST /<service> HTTP/1.1` with `Content-Length` and the data as body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Post;

/// Data sent as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Full;

fn put_host(out: &mut ScratchWriter<'_, '_>, loc: &ParsedLocation) -> Result<(), RequestError> {
    out.put_str(" HTTP/1.1\r\nHost: ")?;
    out.put_str(&loc.host)?;
    if let Some(port) = loc.port {
        out.put(b":")?;
        out.put_decimal(port.into())?;
    }
    Ok(())
}

impl BuildRequest for Get {
    const NAME: &'static str = "http";

    fn build<'a>(msg: &'a Message, loc: &ParsedLocation) -> Result<RequestData<'a>, RequestError> {
        let mut req = RequestData::new(50 + loc.service.len() + msg.data.len() + loc.host.len() + loc.port_len());

        let mut out = req.scratch();
        out.put_str("GET /")?;
        out.put_str(&loc.service)?;
        if !msg.data.is_empty() {
            out.put(b"?")?;
            out.put(&msg.data)?;
        }
        put_host(&mut out, loc)?;
        out.put_str("\r\n\r\n")?;
        out.commit();

        metrics::record_request_built(Self::NAME, req.len());
        Ok(req)
    }
}

impl BuildRequest for Post {
    const NAME: &'static str = "post";

    fn build<'a>(msg: &'a Message, loc: &ParsedLocation) -> Result<RequestData<'a>, RequestError> {
        let mut req = RequestData::new(100 + loc.service.len() + loc.host.len() + loc.port_len());

        let mut out = req.scratch();
        out.put_str("POST /")?;
        out.put_str(&loc.service)?;
        put_host(&mut out, loc)?;
        out.put_str("\r\nContent-Length: ")?;
        out.put_decimal(msg.data.len())?;
        out.put_str("\r\n\r\n")?;
        out.commit();

        req.add_fragment(&msg.data);

        metrics::record_request_built(Self::NAME, req.len());
        Ok(req)
    }
}

impl BuildRequest for Full {
    const NAME: &'static str = "full";

    fn build<'a>(msg: &'a Message, _loc: &ParsedLocation) -> Result<RequestData<'a>, RequestError> {
        let mut req = RequestData::new(0);
        req.add_fragment(&msg.data);

        metrics::record_request_built(Self::NAME, req.len());
        Ok(req)
    }
}

/// Builder selected by a message's scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Get,
    Post,
    Full,
}

impl Protocol {
    /// Resolve a scheme name. Secure (`s`) and http2 (`2`) variants map to
    /// the same strategy as their base scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "http" | "https" | "http2" => Some(Self::Get),
            "post" | "posts" | "post2" => Some(Self::Post),
            "full" | "fulls" | "full2" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Get => Get::NAME,
            Self::Post => Post::NAME,
            Self::Full => Full::NAME,
        }
    }

    pub fn build<'a>(self, msg: &'a Message, loc: &ParsedLocation) -> Result<RequestData<'a>, RequestError> {
        match self {
            Self::Get => Get::build(msg, loc),
            Self::Post => Post::build(msg, loc),
            Self::Full => Full::build(msg, loc),
        }
    }
}

/// Parse the message address and build it with the matching strategy.
///
/// Passthrough messages are dispatched on the scheme alone, since their data
/// is already a complete request and needs no host.
pub fn build_message(msg: &Message) -> Result<RequestData<'_>, RequestError> {
    if Protocol::from_scheme(&msg.scheme()) == Some(Protocol::Full) {
        tracing::trace!(addr = %msg.addr, builder = Full::NAME, "Building request");
        return Full::build(msg, &ParsedLocation::default());
    }

    let loc = msg.location()?;
    let protocol =
        Protocol::from_scheme(&loc.scheme).ok_or_else(|| RequestError::UnsupportedScheme(loc.scheme.clone()))?;
    tracing::trace!(scheme = %loc.scheme, builder = protocol.name(), "Building request");
    protocol.build(msg, &loc)
}
