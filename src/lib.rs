//! HTTP transport building blocks.
//!
//! - `sync`: lock-free growable storage for per-request and per-connection state
//! - `http`: turning messages into wire-ready HTTP/1.1 requests
//! - `net`: connection limits and connection accounting
//! - `config`, `observability`: the ambient stack

pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod sync;

pub use config::TransportConfig;
pub use http::{Message, RequestData};
pub use net::{ConnectionLimits, ConnectionRegistry};
pub use sync::LockFreeSequence;
