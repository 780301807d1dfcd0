//! Connection policy subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (I/O layer)
//!     → connection.rs (ID, per-connection state slot, active count)
//!     → limits.rs (soft/hard thresholds from config)
//!     → LimitPressure reported back to the I/O layer
//! ```
//!
//! # Design Decisions
//! - This layer measures; refusing connections is left to the accept loop
//! - State slots come from lock-free storage, so registration never blocks

pub mod connection;
pub mod limits;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionRegistry, LimitPressure};
pub use limits::ConnectionLimits;
