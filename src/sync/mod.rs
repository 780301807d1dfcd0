//! Lock-free storage subsystem.
//!
//! # Data Flow
//! ```text
//! caller asks for index n
//!     → sequence.rs (locate segment, publish on first touch)
//!     → stable &T handed back
//!     → net::connection stores per-connection state here
//! ```
//!
//! # Design Decisions
//! - No locks anywhere on the access path
//! - Storage only grows; slots are reclaimed with the whole container

pub mod sequence;

pub use sequence::{locate, LockFreeSequence, SequenceError};
