//! Per-connection state and connection accounting.
//!
//! # Responsibilities
//! - Generate connection IDs that double as storage indices
//! - Keep per-connection state in lock-free storage
//! - Count active connections and report pressure against the limits
//!
//! # Design Decisions
//! - IDs are dense and never reused, so a state slot belongs to exactly one
//!   connection for the registry's lifetime
//! - Limits live behind an `ArcSwap` so configuration reloads never block
//!   the accept path

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwap;

use crate::net::limits::ConnectionLimits;
use crate::observability::metrics;
use crate::sync::{LockFreeSequence, SequenceError};

/// Unique identifier for a connection within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(usize);

impl ConnectionId {
    /// Index of this connection's state slot.
    pub fn as_index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where the active connection count sits relative to the limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPressure {
    /// At or below the soft limit.
    Normal,
    /// Above the soft limit, inside the overflow band.
    Overflow { excess: usize },
    /// At or beyond the hard limit.
    Exhausted,
}

/// Tracks connections and their state.
pub struct ConnectionRegistry<S> {
    slots: LockFreeSequence<S>,
    next_id: AtomicUsize,
    registered: AtomicUsize,
    active: AtomicUsize,
    limits: ArcSwap<ConnectionLimits>,
}

impl<S> ConnectionRegistry<S> {
    /// Current count of active connections.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Total connections ever registered. Failed registrations are not
    /// counted.
    pub fn registered_count(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    /// Snapshot of the current limits.
    pub fn limits(&self) -> ConnectionLimits {
        **self.limits.load()
    }

    /// Swap in new limits.
    pub fn update_limits(&self, limits: ConnectionLimits) {
        tracing::info!(soft = limits.soft, hard = limits.hard, "Connection limits updated");
        self.limits.store(limits.into());
    }

    /// Pressure of the current active count against the current limits.
    pub fn pressure(&self) -> LimitPressure {
        let limits = self.limits();
        let excess = ConnectionLimits::exceed_limit(self.active_count(), limits.soft);
        if excess == 0 {
            LimitPressure::Normal
        } else if excess < limits.delta() {
            LimitPressure::Overflow { excess }
        } else {
            LimitPressure::Exhausted
        }
    }
}

impl<S: Default> ConnectionRegistry<S> {
    /// Create an empty registry.
    pub fn new(limits: ConnectionLimits) -> Self {
        Self {
            slots: LockFreeSequence::new(),
            next_id: AtomicUsize::new(0),
            registered: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            limits: ArcSwap::from_pointee(limits),
        }
    }

    /// Record a new active connection. The guard decrements the count on drop.
    pub fn register(&self) -> ConnectionGuard<'_, S> {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.track(id, self.slots.get(id.0))
    }

    /// Like [`register`](Self::register), reporting allocation failure instead
    /// of aborting.
    ///
    /// A failed attempt still consumes its ID, so IDs after a failure are no
    /// longer dense.
    pub fn try_register(&self) -> Result<ConnectionGuard<'_, S>, SequenceError> {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let state = self.slots.try_get(id.0)?;
        Ok(self.track(id, state))
    }

    /// State slot of any connection registered so far.
    pub fn state(&self, id: ConnectionId) -> &S {
        self.slots.get(id.0)
    }

    fn track<'r>(&'r self, id: ConnectionId, state: &'r S) -> ConnectionGuard<'r, S> {
        self.registered.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(active);
        tracing::trace!(connection_id = %id, active, "Connection registered");
        ConnectionGuard {
            registry: self,
            id,
            state,
        }
    }
}

impl<S: Default> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self::new(ConnectionLimits::default())
    }
}

impl<S> std::fmt::Debug for ConnectionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("active", &self.active_count())
            .field("registered", &self.registered_count())
            .field("limits", &self.limits())
            .finish()
    }
}

/// Guard that tracks a connection's lifetime and derefs to its state.
pub struct ConnectionGuard<'r, S> {
    registry: &'r ConnectionRegistry<S>,
    id: ConnectionId,
    state: &'r S,
}

impl<S> ConnectionGuard<'_, S> {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<S> Deref for ConnectionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.state
    }
}

impl<S> Drop for ConnectionGuard<'_, S> {
    fn drop(&mut self) {
        let active = self.registry.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(active);
        tracing::trace!(connection_id = %self.id, active, "Connection closed");
    }
}
