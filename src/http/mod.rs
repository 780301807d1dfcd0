//! HTTP request construction subsystem.
//!
//! # Data Flow
//! ```text
//! Message { addr, data }
//!     → location.rs (addr → scheme, host, port, service)
//!     → normalize.rs (optional: headers + content → passthrough message)
//!     → builder.rs (GET / POST / FULL strategy by scheme)
//!     → request.rs (scratch head + borrowed payload fragments)
//!     → written to the connection by the I/O layer
//! ```
//!
//! # Design Decisions
//! - Only HTTP/1.1 request heads are produced here; responses are not parsed
//! - Payloads are never copied on the builder path
//! - Everything is single-threaded and allocate-and-return

pub mod builder;
pub mod error;
pub mod location;
pub mod message;
pub mod normalize;
pub mod request;

pub use builder::{build_message, BuildRequest, Full, Get, Post, Protocol};
pub use error::RequestError;
pub use location::ParsedLocation;
pub use message::Message;
pub use normalize::{
    join_url_parts, make_full_request, make_full_request_from_parts, url_parts_len, write_url_parts,
    RequestFlags, RequestOptions, RequestType, DEFAULT_CONTENT_TYPE,
};
pub use request::RequestData;
