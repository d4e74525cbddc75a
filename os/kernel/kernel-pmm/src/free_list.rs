use crate::range::FrameId;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use kernel_sync::{SpinLock, SpinLockGuard};

/// End-of-list marker in `head` and `next`.
const NIL: u32 = u32::MAX;

/// Proof that the pool lock is held.
pub(crate) type PoolGuard<'a> = SpinLockGuard<'a, ()>;

/// LIFO list of free frame identifiers.
///
/// The list is linked through a side array indexed by frame id rather than
/// through the frames themselves, so a free frame's bytes belong entirely to
/// its fill pattern:
///
/// ```text
///  head ─► 7     next[7] ─► 3     next[3] ─► 0     next[0] ─► NIL
/// ```
///
/// # Invariants
/// - `head`, `next` and `len` change only while the pool lock is held; every
///   mutator takes the lock's guard as a witness.
/// - A frame id is linked at most once; `len` is the number of linked ids.
/// - The fields are atomics so diagnostics can walk the list without taking
///   the lock. Such a walk is a snapshot and may be torn by a concurrent
///   push or pop.
pub(crate) struct FreeList<const N: usize> {
    lock: SpinLock<()>,
    head: AtomicU32,
    len: AtomicUsize,
    next: [AtomicU32; N],
}

/// Result of a lock-free walk over the list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Walk {
    pub(crate) len: usize,
    /// The walk hit a link outside the table or more than `N` nodes.
    pub(crate) corrupt: bool,
}

impl<const N: usize> FreeList<N> {
    pub(crate) const fn new() -> Self {
        const { assert!(N < NIL as usize, "frame capacity must fit below the list terminator") };
        Self {
            lock: SpinLock::named("frame-pool", ()),
            head: AtomicU32::new(NIL),
            len: AtomicUsize::new(0),
            next: [const { AtomicU32::new(NIL) }; N],
        }
    }

    #[inline]
    pub(crate) fn lock(&self) -> PoolGuard<'_> {
        self.lock.lock()
    }

    pub(crate) fn push(&self, held: &PoolGuard<'_>, id: FrameId) {
        debug_assert!(held.guards(&self.lock));
        let head = self.head.load(Ordering::Relaxed);
        self.next[id.index()].store(head, Ordering::Relaxed);
        // Release pairs with the Acquire in `walk` so the new link is visible.
        self.head.store(id.as_u32(), Ordering::Release);
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pop(&self, held: &PoolGuard<'_>) -> Option<FrameId> {
        debug_assert!(held.guards(&self.lock));
        let head = self.head.load(Ordering::Relaxed);
        if head == NIL {
            return None;
        }
        let slot = &self.next[head as usize];
        self.head.store(slot.load(Ordering::Relaxed), Ordering::Release);
        slot.store(NIL, Ordering::Relaxed);
        self.len.fetch_sub(1, Ordering::Relaxed);
        Some(FrameId::new(head))
    }

    /// Length as maintained by push/pop.
    #[inline]
    pub(crate) fn recorded_len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Visit the linked ids in list order without taking the lock.
    ///
    /// Bounded by `N` steps, so a cycle cannot hang the caller. Only ids
    /// inside the table are passed to `visit`.
    pub(crate) fn walk(&self, mut visit: impl FnMut(FrameId)) -> Walk {
        let mut len = 0;
        let mut cursor = self.head.load(Ordering::Acquire);
        while cursor != NIL {
            if len == N || cursor as usize >= N {
                return Walk { len, corrupt: true };
            }
            visit(FrameId::new(cursor));
            len += 1;
            cursor = self.next[cursor as usize].load(Ordering::Relaxed);
        }
        Walk {
            len,
            corrupt: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn link(&self, from: FrameId, to: FrameId) {
        self.next[from.index()].store(to.as_u32(), Ordering::Relaxed);
    }
}
