//! Connection count thresholds.
//!
//! # Responsibilities
//! - Hold the soft and hard limits on concurrently held resources
//! - Compute the overflow band between them
//!
//! # Design Decisions
//! - Plain value type; comparing live counts and enforcing is the caller's job
//! - `hard >= soft` is a convention, not enforced: an inverted pair yields a
//!   zero delta and a warning

use serde::{Deserialize, Serialize};

/// Default soft limit.
pub const DEFAULT_SOFT_LIMIT: usize = 10_000;

/// Default hard limit.
pub const DEFAULT_HARD_LIMIT: usize = 15_000;

/// Soft/hard connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionLimits {
    /// Count at which backpressure should begin.
    pub soft: usize,

    /// Count at which new resources must be refused.
    pub hard: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            soft: DEFAULT_SOFT_LIMIT,
            hard: DEFAULT_HARD_LIMIT,
        }
    }
}

impl ConnectionLimits {
    /// Create limits, warning when `soft > hard`.
    pub fn new(soft: usize, hard: usize) -> Self {
        let limits = Self { soft, hard };
        if limits.is_inverted() {
            tracing::warn!(soft, hard, "Soft limit exceeds hard limit; no overflow band");
        }
        limits
    }

    /// Permitted transient overflow above the soft limit.
    pub fn delta(&self) -> usize {
        Self::exceed_limit(self.hard, self.soft)
    }

    /// How far `val` is above `limit`, or 0.
    pub fn exceed_limit(val: usize, limit: usize) -> usize {
        val.saturating_sub(limit)
    }

    /// Whether the soft limit is above the hard limit.
    pub fn is_inverted(&self) -> bool {
        self.soft > self.hard
    }
}
