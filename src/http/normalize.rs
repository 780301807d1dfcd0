//! Rewriting short-form messages into complete requests.
//!
//! # Responsibilities
//! - Resolve the request method (`Any` → GET or POST)
//! - Write the request line in origin form or absolute form
//! - Append caller headers, `Content-Length`/`Content-Type` and the content
//! - Produce a new message on the passthrough scheme (`full`, `fulls`, `full2`)
//! - Join URL parts into a query string
//!
//! # Design Decisions
//! - Pure transform: the input message is never modified
//! - Output is written into a pre-sized scratch buffer, like the builders
//! - Caller headers are copied verbatim; a missing trailing CRLF is added

use std::io::{self, Write};
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::http::error::RequestError;
use crate::http::message::Message;
use crate::http::request::{RequestData, ScratchWriter};
use crate::observability::metrics;

/// Content type used when the caller does not pick one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Fixed bytes of the request head besides the variable fields.
const HEAD_OVERHEAD: usize = 128;

/// Requested HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// GET for empty content on an http-family scheme, POST otherwise.
    #[default]
    Any,
    Post,
    Get,
    Put,
    Delete,
}

impl RequestType {
    /// Resolve `Any` against the content and scheme; explicit types are kept.
    pub fn resolve(self, content_is_empty: bool, scheme: &str) -> Self {
        match self {
            Self::Any if content_is_empty && is_http_scheme(scheme) => Self::Get,
            Self::Any => Self::Post,
            explicit => explicit,
        }
    }

    /// Method token for the request line. `Any` resolves to POST here.
    pub fn method(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Any | Self::Post => "POST",
        }
    }
}

/// Request rewriting flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFlags(u8);

impl RequestFlags {
    pub const NONE: Self = Self(0);

    /// Write the request target in absolute form (`POST http://host/path`),
    /// as proxies expect (RFC 7230 section 5.3.2).
    pub const ABSOLUTE_URI: Self = Self(1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RequestFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RequestFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Everything besides the message that goes into a full request.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions<'a> {
    /// Header lines, each terminated by CRLF.
    pub headers: &'a str,
    pub content: &'a [u8],
    pub content_type: &'a str,
    pub request_type: RequestType,
    pub flags: RequestFlags,
}

impl Default for RequestOptions<'_> {
    fn default() -> Self {
        Self {
            headers: "",
            content: b"",
            content_type: DEFAULT_CONTENT_TYPE,
            request_type: RequestType::Any,
            flags: RequestFlags::NONE,
        }
    }
}

impl<'a> RequestOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: &'a str) -> Self {
        self.headers = headers;
        self
    }

    pub fn content(mut self, content: &'a [u8]) -> Self {
        self.content = content;
        self
    }

    pub fn content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = request_type;
        self
    }

    pub fn flags(mut self, flags: RequestFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Whether `scheme` belongs to the plain http family.
pub fn is_http_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https" | "http2")
}

fn passthrough_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" | "post" => Some("full"),
        "https" | "posts" => Some("fulls"),
        "http2" | "post2" => Some("full2"),
        _ => None,
    }
}

fn absolute_scheme(scheme: &str) -> &'static str {
    match scheme {
        "https" | "posts" => "https",
        _ => "http",
    }
}

/// Exact length of `parts` joined with `&`.
pub fn url_parts_len<S: AsRef<str>>(parts: &[S]) -> usize {
    let bytes: usize = parts.iter().map(|p| p.as_ref().len()).sum();
    bytes + parts.len().saturating_sub(1)
}

/// Write `part1&part2&...`.
pub fn join_url_parts<S: AsRef<str>, W: Write + ?Sized>(parts: &[S], out: &mut W) -> io::Result<()> {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.write_all(b"&")?;
        }
        out.write_all(part.as_ref().as_bytes())?;
    }
    Ok(())
}

/// Write `?` followed by the joined parts.
pub fn write_url_parts<S: AsRef<str>, W: Write + ?Sized>(parts: &[S], out: &mut W) -> io::Result<()> {
    out.write_all(b"?")?;
    join_url_parts(parts, out)
}

/// Where the query string of the request target comes from.
enum Query<'q, S> {
    /// The message data, used verbatim.
    Raw(&'q [u8]),
    /// Parts joined with `&`.
    Parts(&'q [S]),
}

impl<S: AsRef<str>> Query<'_, S> {
    /// Bytes taken by `?query`, or 0 when there is no query.
    fn len(&self) -> usize {
        match self {
            Self::Raw(data) if data.is_empty() => 0,
            Self::Raw(data) => 1 + data.len(),
            Self::Parts(parts) => 1 + url_parts_len(parts),
        }
    }

    fn write_to(&self, out: &mut ScratchWriter<'_, '_>) -> Result<(), RequestError> {
        match self {
            Self::Raw(data) if data.is_empty() => Ok(()),
            Self::Raw(data) => {
                out.put(b"?")?;
                out.put(data)
            }
            Self::Parts(parts) => write_url_parts(parts, out).map_err(|_| RequestError::ScratchOverflow {
                needed: out.written() + self.len(),
                capacity: out.capacity(),
            }),
        }
    }
}

/// Rewrite `msg` into a complete request on its passthrough scheme.
///
/// `msg.data` is used as the query string of the request target.
pub fn make_full_request(msg: &Message, opts: &RequestOptions<'_>) -> Result<Message, RequestError> {
    make_full_request_impl(msg, Query::<String>::Raw(&msg.data), opts)
}

/// Like [`make_full_request`], but the query string is built from `url_parts`
/// and `msg.data` is ignored.
pub fn make_full_request_from_parts<S: AsRef<str>>(
    msg: &Message,
    url_parts: &[S],
    opts: &RequestOptions<'_>,
) -> Result<Message, RequestError> {
    if url_parts.is_empty() {
        tracing::debug!(addr = %msg.addr, "No url parts to build a full request from");
        return Err(RequestError::EmptyUrlParts);
    }
    make_full_request_impl(msg, Query::Parts(url_parts), opts)
}

fn make_full_request_impl<S: AsRef<str>>(
    msg: &Message,
    query: Query<'_, S>,
    opts: &RequestOptions<'_>,
) -> Result<Message, RequestError> {
    let loc = msg.location()?;
    let scheme = passthrough_scheme(&loc.scheme).ok_or_else(|| {
        tracing::debug!(scheme = %loc.scheme, "Scheme has no passthrough form");
        RequestError::UnsupportedScheme(loc.scheme.clone())
    })?;

    let request_type = opts.request_type.resolve(opts.content.is_empty(), &loc.scheme);
    let method = request_type.method();
    let absolute = opts.flags.contains(RequestFlags::ABSOLUTE_URI);

    let estimate = HEAD_OVERHEAD
        + 2 * loc.host.len()
        + loc.service.len()
        + query.len()
        + opts.headers.len()
        + opts.content_type.len()
        + opts.content.len();
    let mut req = RequestData::new(estimate);
    let mut out = req.scratch();

    out.put_str(method)?;
    out.put(b" ")?;
    if absolute {
        out.put_str(absolute_scheme(&loc.scheme))?;
        out.put_str("://")?;
        out.put_str(&loc.endpoint())?;
    }
    out.put(b"/")?;
    out.put_str(&loc.service)?;
    query.write_to(&mut out)?;

    out.put_str(" HTTP/1.1\r\nHost: ")?;
    out.put_str(&loc.endpoint())?;
    out.put_str("\r\n")?;

    if !opts.headers.is_empty() {
        out.put_str(opts.headers)?;
        if !opts.headers.ends_with("\r\n") {
            out.put_str("\r\n")?;
        }
    }

    if !opts.content.is_empty() {
        out.put_str("Content-Length: ")?;
        out.put_decimal(opts.content.len())?;
        out.put_str("\r\n")?;
        if !opts.content_type.is_empty() {
            out.put_str("Content-Type: ")?;
            out.put_str(opts.content_type)?;
            out.put_str("\r\n")?;
        }
    }

    out.put_str("\r\n")?;
    out.put(opts.content)?;
    out.commit();

    let rest = msg.addr.split_once(':').map_or("", |(_, rest)| rest);
    let full = Message {
        addr: format!("{scheme}:{rest}"),
        data: req.into_scratch(),
    };

    tracing::debug!(
        addr = %full.addr,
        method,
        absolute,
        bytes = full.data.len(),
        "Message rewritten to passthrough form"
    );
    metrics::record_full_request(method);

    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(msg: &Message) -> &str {
        std::str::from_utf8(&msg.data).unwrap()
    }

    #[test]
    fn any_without_content_on_http_is_get() {
        let msg = Message::new("http://example.com/search", "q=1");
        let full = make_full_request(&msg, &RequestOptions::new()).unwrap();
        assert_eq!(full.addr, "full://example.com/search");
        assert_eq!(wire(&full), "GET /search?q=1 HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn any_with_content_is_post_regardless_of_scheme() {
        for addr in ["http://example.com/api", "https://example.com/api", "post://example.com/api"] {
            let msg = Message::new(addr, "");
            let opts = RequestOptions::new().content(b"{\"a\":1}").content_type("application/json");
            let full = make_full_request(&msg, &opts).unwrap();
            assert!(wire(&full).starts_with("POST /api HTTP/1.1\r\n"), "{addr}");
            assert!(wire(&full).ends_with(
                "Content-Length: 7\r\nContent-Type: application/json\r\n\r\n{\"a\":1}"
            ));
        }
    }

    #[test]
    fn any_without_content_on_post_scheme_is_post() {
        let msg = Message::new("post://example.com/api", "");
        let full = make_full_request(&msg, &RequestOptions::new()).unwrap();
        assert_eq!(wire(&full), "POST /api HTTP/1.1\r\nHost: example.com\r\n\r\n");
        assert_eq!(full.addr, "full://example.com/api");
    }

    #[test]
    fn explicit_type_is_kept() {
        let msg = Message::new("http://example.com/item/7", "");
        let opts = RequestOptions::new().request_type(RequestType::Delete);
        let full = make_full_request(&msg, &opts).unwrap();
        assert!(wire(&full).starts_with("DELETE /item/7 HTTP/1.1\r\n"));

        let opts = RequestOptions::new().request_type(RequestType::Put).content(b"x");
        let full = make_full_request(&msg, &opts).unwrap();
        assert!(wire(&full).starts_with("PUT /item/7 HTTP/1.1\r\n"));
    }

    #[test]
    fn headers_come_before_content_length() {
        let msg = Message::new("http://example.com:8080/upload", "");
        let opts = RequestOptions::new()
            .headers("X-Trace: 1\r\nAccept: */*")
            .content(b"abc");
        let full = make_full_request(&msg, &opts).unwrap();
        assert_eq!(
            wire(&full),
            "POST /upload HTTP/1.1\r\nHost: example.com:8080\r\nX-Trace: 1\r\nAccept: */*\r\n\
             Content-Length: 3\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\nabc"
        );
    }

    #[test]
    fn empty_content_type_is_omitted() {
        let msg = Message::new("post://example.com/", "");
        let opts = RequestOptions::new().content(b"abc").content_type("");
        let full = make_full_request(&msg, &opts).unwrap();
        assert_eq!(
            wire(&full),
            "POST / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[test]
    fn absolute_uri_for_proxies() {
        let msg = Message::new("post2://example.com:3128/path", "");
        let opts = RequestOptions::new().flags(RequestFlags::ABSOLUTE_URI).content(b"x");
        let full = make_full_request(&msg, &opts).unwrap();
        assert!(wire(&full).starts_with("POST http://example.com:3128/path HTTP/1.1\r\n"));
        assert_eq!(full.addr, "full2://example.com:3128/path");

        let msg = Message::new("https://secure.example.com/a", "");
        let full = make_full_request(&msg, &RequestOptions::new().flags(RequestFlags::ABSOLUTE_URI)).unwrap();
        assert!(wire(&full).starts_with("GET https://secure.example.com/a HTTP/1.1\r\n"));
        assert_eq!(full.addr, "fulls://secure.example.com/a");
    }

    #[test]
    fn host_line_matches_rewritten_address() {
        let msg = Message::new("http://h:80/x", "");
        let full = make_full_request(&msg, &RequestOptions::new()).unwrap();
        assert_eq!(full.addr, "full://h:80/x");
        assert_eq!(wire(&full), "GET /x HTTP/1.1\r\nHost: h:80\r\n\r\n");
    }

    #[test]
    fn url_parts_replace_message_data() {
        let msg = Message::new("http://example.com/search", "ignored=1");
        let full = make_full_request_from_parts(&msg, &["a=1", "b=2"], &RequestOptions::new()).unwrap();
        assert_eq!(wire(&full), "GET /search?a=1&b=2 HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn empty_url_parts_fail() {
        let msg = Message::new("http://example.com/search", "");
        let parts: [&str; 0] = [];
        assert_eq!(
            make_full_request_from_parts(&msg, &parts, &RequestOptions::new()),
            Err(RequestError::EmptyUrlParts)
        );
    }

    #[test]
    fn unusable_locations_fail() {
        let msg = Message::new("full://example.com/", "");
        assert_eq!(
            make_full_request(&msg, &RequestOptions::new()),
            Err(RequestError::UnsupportedScheme("full".to_string()))
        );

        let msg = Message::new("::::", "");
        assert!(matches!(
            make_full_request(&msg, &RequestOptions::new()),
            Err(RequestError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn input_message_is_untouched() {
        let msg = Message::new("http://example.com/search", "q=1");
        let before = msg.clone();
        let _ = make_full_request(&msg, &RequestOptions::new().content(b"body")).unwrap();
        assert_eq!(msg, before);
    }

    #[test]
    fn url_part_helpers() {
        let parts = ["a=1", "b=2"];
        assert_eq!(url_parts_len(&parts), 7);

        let mut joined = Vec::new();
        join_url_parts(&parts, &mut joined).unwrap();
        assert_eq!(joined, b"a=1&b=2");

        let mut query = Vec::new();
        write_url_parts(&parts, &mut query).unwrap();
        assert_eq!(query, b"?a=1&b=2");

        let empty: [&str; 0] = [];
        assert_eq!(url_parts_len(&empty), 0);
    }

    #[test]
    fn request_type_resolution() {
        assert_eq!(RequestType::Any.resolve(true, "http2"), RequestType::Get);
        assert_eq!(RequestType::Any.resolve(true, "post"), RequestType::Post);
        assert_eq!(RequestType::Any.resolve(false, "http"), RequestType::Post);
        assert_eq!(RequestType::Get.resolve(false, "post"), RequestType::Get);
    }

    #[test]
    fn flags_combine() {
        let mut flags = RequestFlags::NONE;
        assert!(!flags.contains(RequestFlags::ABSOLUTE_URI));
        flags |= RequestFlags::ABSOLUTE_URI;
        assert!(flags.contains(RequestFlags::ABSOLUTE_URI));
        assert_eq!(RequestFlags::NONE | RequestFlags::ABSOLUTE_URI, flags);
    }
}
