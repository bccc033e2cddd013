//! Memory-bounded batch planning.
//!
//! All out-of-core loops in this crate walk contiguous index ranges sized so
//! that the per-batch working set stays under a caller-supplied memory
//! ceiling. The ceiling is advisory: callers must supply an accurate
//! per-item byte cost.

use std::ops::Range;

use crate::error::CleanError;

/// Memory ceiling for a batched operation.
#[derive(Debug, Clone, Copy)]
pub struct MemoryBudget {
    /// Ceiling in bytes.
    pub bytes: usize,
    /// Whether the caller intends to run worker processes alongside this
    /// operation; halves the effective ceiling.
    pub parallel: bool,
}

impl MemoryBudget {
    /// A sequential budget of `bytes`.
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes,
            parallel: false,
        }
    }

    /// Ceiling actually available to one batch loop.
    pub fn effective(&self) -> usize {
        if self.parallel {
            self.bytes / 2
        } else {
            self.bytes
        }
    }
}

/// What to do when the ceiling admits less than one item per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Floor the batch size to 1 and proceed (may exceed the ceiling).
    FloorToOne,
    /// Fail with `InsufficientMemory`.
    Fail,
}

/// Compute a batch size from available bytes and a per-item cost.
///
/// `FloorToOne` never fails for positive item costs; `Fail` returns
/// `InsufficientMemory` when not even one item fits the ceiling.
pub fn compute_batch_size(
    available_bytes: usize,
    per_item_bytes: usize,
    policy: BatchPolicy,
) -> Result<usize, CleanError> {
    let per_item = per_item_bytes.max(1);
    let batch = available_bytes / per_item;
    if batch < 1 {
        match policy {
            BatchPolicy::FloorToOne => Ok(1),
            BatchPolicy::Fail => Err(CleanError::InsufficientMemory {
                needed: per_item,
                available: available_bytes,
            }),
        }
    } else {
        Ok(batch)
    }
}

/// Lazy sequence of contiguous, non-overlapping ranges covering `[0, total)`.
///
/// The final range may be shorter. The sequence is finite and recomputed
/// fresh each call; there is no shared cursor to restart.
pub fn batches(total: usize, batch_size: usize) -> Batches {
    Batches {
        next: 0,
        total,
        batch_size: batch_size.max(1),
    }
}

/// Iterator returned by [`batches`].
#[derive(Debug, Clone)]
pub struct Batches {
    next: usize,
    total: usize,
    batch_size: usize,
}

impl Iterator for Batches {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next;
        let stop = (start + self.batch_size).min(self.total);
        self.next = stop;
        Some(start..stop)
    }
}
