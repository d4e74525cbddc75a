use crate::error::RefCountError;
use crate::free_list::PoolGuard;
use crate::range::FrameId;
use core::sync::atomic::{AtomicI32, Ordering};
use kernel_sync::SpinLock;

/// Per-frame count of logical owners.
///
/// Every read-modify-write runs under one table-wide lock, so transitions on
/// any frames are linearizable with respect to each other. Counts are stored
/// as atomics only so the diagnostic scan can read them without the lock.
///
/// # Lock order
/// The table lock nests *inside* the pool lock, never around it: nothing in
/// here takes the pool lock, and no table guard escapes a method. The release
/// path proves it already holds the pool lock by passing its guard to
/// [`decrement_and_read`](Self::decrement_and_read).
pub(crate) struct OwnershipTable<const N: usize> {
    lock: SpinLock<()>,
    counts: [AtomicI32; N],
}

impl<const N: usize> OwnershipTable<N> {
    pub(crate) const fn new() -> Self {
        Self {
            lock: SpinLock::named("frame-refcnt", ()),
            counts: [const { AtomicI32::new(0) }; N],
        }
    }

    /// Run `f` on the frame's count cell with the table lock held.
    #[inline]
    fn with_count<R>(&self, frame: FrameId, f: impl FnOnce(&AtomicI32) -> R) -> R {
        let cell = &self.counts[frame.index()];
        self.lock.with_lock(|_| f(cell))
    }

    /// Add one owner.
    pub(crate) fn increment(&self, frame: FrameId) -> Result<i32, RefCountError> {
        self.adjust(frame, 1)
    }

    /// Remove one owner and return how many remain.
    ///
    /// Only the release path calls this, with the pool lock held, so that
    /// "count reached zero" and "frame pushed back" happen in one critical
    /// section.
    pub(crate) fn decrement_and_read(
        &self,
        frame: FrameId,
        _pool: &PoolGuard<'_>,
    ) -> Result<i32, RefCountError> {
        self.with_count(frame, |cell| {
            let count = cell.load(Ordering::Relaxed);
            if count <= 0 {
                return Err(RefCountError::Underflow { frame });
            }
            cell.store(count - 1, Ordering::Relaxed);
            Ok(count - 1)
        })
    }

    #[inline]
    pub(crate) fn read(&self, frame: FrameId) -> i32 {
        self.with_count(frame, |cell| cell.load(Ordering::Relaxed))
    }

    /// Give a frame just popped off the free list its first owner.
    pub(crate) fn stamp_allocated(&self, frame: FrameId) -> Result<(), RefCountError> {
        self.with_count(frame, |cell| {
            let count = cell.load(Ordering::Relaxed);
            if count != 0 {
                return Err(RefCountError::NotFree { frame, count });
            }
            cell.store(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// Add `delta` owners to an allocated frame.
    ///
    /// The frame must have at least one owner before and after; the last
    /// owner only leaves through release.
    pub(crate) fn adjust(&self, frame: FrameId, delta: i32) -> Result<i32, RefCountError> {
        self.with_count(frame, |cell| {
            let count = cell.load(Ordering::Relaxed);
            if count < 1 {
                return Err(RefCountError::NotAllocated { frame, count });
            }
            let updated = count
                .checked_add(delta)
                .ok_or(RefCountError::Overflow { frame })?;
            if updated < 1 {
                return Err(RefCountError::LastOwner { frame, delta });
            }
            cell.store(updated, Ordering::Relaxed);
            Ok(updated)
        })
    }

    /// Lock-free read of one slot, for diagnostics only.
    #[inline]
    pub(crate) fn peek(&self, frame: FrameId) -> i32 {
        self.counts[frame.index()].load(Ordering::Relaxed)
    }

    /// Lock-free snapshot of every slot, for diagnostics only.
    pub(crate) fn snapshot(&self) -> impl Iterator<Item = (FrameId, i32)> + '_ {
        (0..N).map(|index| {
            // N is below u32::MAX, checked when the free list is built.
            #[allow(clippy::cast_possible_truncation)]
            let frame = FrameId::new(index as u32);
            (frame, self.peek(frame))
        })
    }

    #[cfg(test)]
    pub(crate) fn poke(&self, frame: FrameId, count: i32) {
        self.counts[frame.index()].store(count, Ordering::Relaxed);
    }
}
