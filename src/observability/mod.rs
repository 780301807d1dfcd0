//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr via the fmt layer
//!     → whatever metrics recorder the embedding engine installs
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (segment, connection_id, builder)
//! - Metrics are cheap (no-ops without a recorder)

pub mod logging;
pub mod metrics;
