//! Lock-free, index-addressable growable storage.
//!
//! # Responsibilities
//! - Hand out a stable `&T` for any index without taking a lock
//! - Grow by publishing power-of-two segments on first touch
//! - Free every published segment exactly once on drop
//!
//! # Layout
//! ```text
//! segment 0: index 0
//! segment 1: indices 1..=2
//! segment 2: indices 3..=6
//! segment i: 2^i slots starting at index 2^i - 1
//! ```
//!
//! # Design Decisions
//! - Published segments never move; growth only adds segments
//! - Racing publishers allocate speculatively, the compare-exchange loser
//!   frees its own copy and adopts the winner's
//! - Reads of a published segment are a single acquire load

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use thiserror::Error;

use crate::observability::metrics;

/// Number of segment slots, one per bit of `usize`.
pub const MAX_SEGMENTS: usize = usize::BITS as usize;

/// Errors surfaced by [`LockFreeSequence::try_get`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// The index has no segment slot (only `usize::MAX` triggers this).
    #[error("index {0} is beyond the addressable range")]
    IndexOutOfRange(usize),

    /// The allocator could not provide a new segment.
    #[error("failed to allocate segment {segment} ({len} elements)")]
    AllocationFailed { segment: usize, len: usize },
}

/// Map a logical index to `(segment, offset)`.
///
/// Returns `None` for `usize::MAX`, whose segment would need a slot past the
/// end of the table.
#[inline]
pub fn locate(index: usize) -> Option<(usize, usize)> {
    let pos = index.checked_add(1)?;
    let segment = (usize::BITS - 1 - pos.leading_zeros()) as usize;
    Some((segment, pos - (1usize << segment)))
}

/// A growable sequence whose slots keep their address for the lifetime of
/// the container.
///
/// Any number of threads may call [`get`](Self::get) concurrently. Slots are
/// default-constructed when their segment is first touched and dropped only
/// when the whole sequence is dropped, so shared mutation goes through
/// interior mutability in `T`.
pub struct LockFreeSequence<T> {
    segments: [AtomicPtr<T>; MAX_SEGMENTS],
    _owns: PhantomData<*mut T>,
}

// SAFETY: the sequence owns its elements like a `Vec<T>` does.
unsafe impl<T: Send> Send for LockFreeSequence<T> {}

// SAFETY: shared access hands out `&T` to many threads, and a segment built
// on one thread may be dropped on another, so both bounds are required.
unsafe impl<T: Send + Sync> Sync for LockFreeSequence<T> {}

impl<T> LockFreeSequence<T> {
    /// Create an empty sequence. No segment is allocated until first access.
    pub fn new() -> Self {
        Self {
            segments: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
            _owns: PhantomData,
        }
    }

    /// Whether the given segment has been published.
    pub fn is_published(&self, segment: usize) -> bool {
        self.segments
            .get(segment)
            .is_some_and(|slot| !slot.load(Ordering::Acquire).is_null())
    }

    /// Number of published segments.
    pub fn published_segments(&self) -> usize {
        (0..MAX_SEGMENTS).filter(|&i| self.is_published(i)).count()
    }

    /// Total number of slots across published segments.
    pub fn capacity(&self) -> usize {
        (0..MAX_SEGMENTS)
            .filter(|&i| self.is_published(i))
            .map(|i| 1usize << i)
            .sum()
    }
}

impl<T: Default> LockFreeSequence<T> {
    /// Get the slot at `index`, publishing its segment if needed.
    ///
    /// # Panics
    /// Panics if `index == usize::MAX`. Allocation failure is reported through
    /// [`handle_alloc_error`]; use [`try_get`](Self::try_get) to handle it.
    pub fn get(&self, index: usize) -> &T {
        match self.try_get(index) {
            Ok(slot) => slot,
            Err(SequenceError::AllocationFailed { len, .. }) => {
                handle_alloc_error(Layout::array::<T>(len).unwrap_or_else(|_| Layout::new::<T>()))
            }
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the slot at `index`, reporting range and allocation failures.
    pub fn try_get(&self, index: usize) -> Result<&T, SequenceError> {
        let (segment, offset) = locate(index).ok_or(SequenceError::IndexOutOfRange(index))?;
        let base = self.segment(segment)?;

        // SAFETY: `base` points at a published segment of `1 << segment`
        // initialised elements that lives as long as `self`, and
        // `offset < 1 << segment` by construction of `locate`.
        Ok(unsafe { &*base.add(offset) })
    }

    fn segment(&self, segment: usize) -> Result<*mut T, SequenceError> {
        let slot = &self.segments[segment];

        let current = slot.load(Ordering::Acquire);
        if !current.is_null() {
            return Ok(current);
        }

        let candidate = Box::into_raw(allocate_segment::<T>(segment)?).cast::<T>();

        match slot.compare_exchange(
            ptr::null_mut(),
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::debug!(segment, len = 1usize << segment, "Segment published");
                metrics::record_segment_published(segment);
                Ok(candidate)
            }
            Err(winner) => {
                // SAFETY: `candidate` came from `Box::into_raw` above with the
                // same length and was never made visible to other threads.
                drop(unsafe { free_segment(candidate, segment) });
                tracing::trace!(segment, "Lost segment publish race");
                metrics::record_publish_race_lost();
                Ok(winner)
            }
        }
    }
}

impl<T> Default for LockFreeSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeSequence<T> {
    fn drop(&mut self) {
        for (segment, slot) in self.segments.iter_mut().enumerate() {
            let raw = *slot.get_mut();
            if !raw.is_null() {
                // SAFETY: `&mut self` rules out concurrent access, and every
                // non-null slot holds a segment of `1 << segment` elements
                // published exactly once.
                drop(unsafe { free_segment(raw, segment) });
            }
        }
    }
}

impl<T> fmt::Debug for LockFreeSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeSequence")
            .field("published_segments", &self.published_segments())
            .field("capacity", &self.capacity())
            .finish()
    }
}

fn allocate_segment<T: Default>(segment: usize) -> Result<Box<[T]>, SequenceError> {
    let len = 1usize << segment;
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| SequenceError::AllocationFailed { segment, len })?;
    items.resize_with(len, T::default);
    Ok(items.into_boxed_slice())
}

/// Rebuild the owning box of a segment.
///
/// # Safety
/// `raw` must come from `Box::<[T]>::into_raw` of a slice holding exactly
/// `1 << segment` elements, and must not be used afterwards.
unsafe fn free_segment<T>(raw: *mut T, segment: usize) -> Box<[T]> {
    Box::from_raw(ptr::slice_from_raw_parts_mut(raw, 1usize << segment))
}
