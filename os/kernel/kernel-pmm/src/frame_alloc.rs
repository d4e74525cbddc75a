//! Reference-counted physical frame allocator.
//!
//! ```text
//!  allocate                             release
//!  ────────                             ───────
//!  lock(pool)                           validate address (fatal on error)
//!    pop head ──► id                    lock(pool)
//!  unlock(pool)                           lock(refcnt)
//!  fill(fresh)                              count -= 1 ──► remaining
//!  lock(refcnt)                           unlock(refcnt)
//!    count = 1                            remaining > 0 ─► unlock(pool), done
//!  unlock(refcnt)                         fill(stale)
//!                                         push id
//!                                       unlock(pool)
//! ```
//!
//! The pool lock is always taken before the ownership-table lock. Holding it
//! across decrement, fill and push means two racing releases of a shared
//! frame cannot both see the count hit zero and link the frame twice.

use crate::diagnostics::{self, PoolReport};
use crate::error::{AllocError, BuildError, FrameError, RefCountError};
use crate::fill::{FillPatterns, fill_frame};
use crate::free_list::FreeList;
use crate::phys_mapper::PhysMapper;
use crate::range::{FrameId, ManagedRange};
use crate::ref_count::OwnershipTable;
use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};
use log::{error, info, warn};

/// Backing storage for one allocator: the free list and the ownership table,
/// sized for up to `N` frames.
///
/// `const`-constructible so a kernel can keep it in a `static`. A set of
/// tables serves exactly one allocator; [`FrameAllocatorBuilder::build`]
/// claims it.
pub struct FrameTables<const N: usize> {
    pool: FreeList<N>,
    refs: OwnershipTable<N>,
    claimed: AtomicBool,
}

impl<const N: usize> FrameTables<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool: FreeList::new(),
            refs: OwnershipTable::new(),
            claimed: AtomicBool::new(false),
        }
    }

    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }
}

impl<const N: usize> Default for FrameTables<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One-time setup of a [`FrameAllocator`].
///
/// ```rust
/// use kernel_memory_addresses::PhysicalAddress;
/// use kernel_pmm::{FrameAllocatorBuilder, FrameTables, IdentityPhysMapper};
///
/// # let layout = std::alloc::Layout::from_size_align(4 * 4096, 4096).unwrap();
/// # let arena = unsafe { std::alloc::alloc(layout) };
/// let start = PhysicalAddress::from_ptr(arena);
/// let end = start + 4 * 4096;
///
/// let tables = FrameTables::<8>::new();
/// // SAFETY: the arena is exclusively ours and identity-mapped.
/// let pmm = unsafe { FrameAllocatorBuilder::new(start, end).build(&tables, IdentityPhysMapper) }
///     .unwrap();
///
/// let frame = pmm.allocate().unwrap();
/// assert_eq!(pmm.ref_count(frame), 1);
/// pmm.release(frame);
/// assert_eq!(pmm.free_frames(), 4);
/// # unsafe { std::alloc::dealloc(arena, layout) };
/// ```
#[derive(Debug, Copy, Clone)]
pub struct FrameAllocatorBuilder<S: PageSize = Size4K> {
    range_start: PhysicalAddress,
    range_end: PhysicalAddress,
    fill: FillPatterns,
    _size: PhantomData<S>,
}

impl FrameAllocatorBuilder<Size4K> {
    /// Manage the 4 KiB frames in `[range_start, range_end)`.
    #[must_use]
    pub fn new(range_start: impl Into<PhysicalAddress>, range_end: impl Into<PhysicalAddress>) -> Self {
        Self::with_page_size(range_start, range_end)
    }
}

impl<S: PageSize> FrameAllocatorBuilder<S> {
    /// Manage the `S`-sized frames in `[range_start, range_end)`.
    #[must_use]
    pub fn with_page_size(
        range_start: impl Into<PhysicalAddress>,
        range_end: impl Into<PhysicalAddress>,
    ) -> Self {
        Self {
            range_start: range_start.into(),
            range_end: range_end.into(),
            fill: FillPatterns::DEFAULT,
            _size: PhantomData,
        }
    }

    #[must_use]
    pub const fn fill_patterns(mut self, fill: FillPatterns) -> Self {
        self.fill = fill;
        self
    }

    /// Claim `tables` and put every whole frame of the range on the free list.
    ///
    /// `range_start` is rounded up to a page boundary and a partial page at
    /// `range_end` is left out. Frames are filled with the stale pattern and
    /// pushed lowest address first, so the highest frame is handed out first.
    ///
    /// # Safety
    /// - The range must be RAM owned exclusively by the returned allocator.
    /// - Every frame in it must be mapped writable through `mapper` for the
    ///   allocator's lifetime.
    ///
    /// # Errors
    /// See [`BuildError`]. On error the tables are left unclaimed unless the
    /// error is [`BuildError::AlreadyInitialized`].
    pub unsafe fn build<M: PhysMapper, const N: usize>(
        self,
        tables: &FrameTables<N>,
        mapper: M,
    ) -> Result<FrameAllocator<'_, M, N, S>, BuildError> {
        let fill = self.fill.validate()?;
        let range = ManagedRange::<S>::covering(self.range_start, self.range_end, N)?;
        if !tables.claim() {
            return Err(BuildError::AlreadyInitialized);
        }

        let pmm = FrameAllocator {
            tables,
            mapper,
            range,
            fill,
        };

        {
            let held = tables.pool.lock();
            for id in range.ids() {
                // SAFETY: caller vouches for the range and the mapping.
                unsafe { fill_frame(&pmm.mapper, range.frame(id), fill.stale) };
                tables.pool.push(&held, id);
            }
        }

        info!(
            "frame pool: {} x {} frames in [{}, {})",
            range.frame_count(),
            S::as_str(),
            range.start(),
            range.end()
        );
        Ok(pmm)
    }
}

/// Handle to a physical frame pool with per-frame ownership counts.
///
/// Every frame of the managed range is at all quiescent points either on the
/// free list with count 0 or owned with count ≥ 1. The handle is `Sync`
/// whenever the mapper is; share it by reference.
pub struct FrameAllocator<'t, M, const N: usize, S: PageSize = Size4K> {
    tables: &'t FrameTables<N>,
    mapper: M,
    range: ManagedRange<S>,
    fill: FillPatterns,
}

impl<M: PhysMapper, const N: usize, S: PageSize> FrameAllocator<'_, M, N, S> {
    /// Take a frame off the free list.
    ///
    /// The frame comes back filled with the fresh pattern and with an
    /// ownership count of exactly 1. Returns `None` right away when the pool
    /// is empty, after logging a diagnostic summary.
    pub fn allocate(&self) -> Option<PhysicalPage<S>> {
        let popped = {
            let held = self.tables.pool.lock();
            self.tables.pool.pop(&held)
        };

        let Some(id) = popped else {
            warn!("frame pool exhausted");
            self.dump_diagnostics();
            return None;
        };

        let frame = self.range.frame(id);
        // SAFETY: popped frames are unreachable by anyone else until the
        // caller publishes them.
        unsafe { fill_frame(&self.mapper, frame, self.fill.fresh) };
        if let Err(e) = self.tables.refs.stamp_allocated(id) {
            corruption("allocate", frame.base(), &e);
        }
        Some(frame)
    }

    /// [`allocate`](Self::allocate) with a typed error.
    ///
    /// # Errors
    /// [`AllocError::Exhausted`] when no frame is free.
    pub fn try_allocate(&self) -> Result<PhysicalPage<S>, AllocError> {
        self.allocate().ok_or(AllocError::Exhausted {
            managed: self.range.frame_count(),
        })
    }

    /// Drop one owner of `frame`; the last owner returns it to the free list.
    ///
    /// # Panics
    /// If `frame` is not a page-aligned address inside the managed range, or
    /// if the frame is already free. Both are caller bugs.
    pub fn release(&self, frame: impl Into<PhysicalAddress>) {
        let addr = frame.into();
        let id = self
            .validate(addr)
            .unwrap_or_else(|e| contract_violation("release", addr, &e));

        let held = self.tables.pool.lock();
        let remaining = self
            .tables
            .refs
            .decrement_and_read(id, &held)
            .unwrap_or_else(|e| contract_violation("release", addr, &e));
        if remaining > 0 {
            return;
        }

        // SAFETY: the last owner is gone and the pool lock is held.
        unsafe { fill_frame(&self.mapper, self.range.frame(id), self.fill.stale) };
        self.tables.pool.push(&held, id);
    }

    /// Current number of owners of `frame`.
    ///
    /// # Panics
    /// If `frame` is not a page-aligned address inside the managed range.
    #[must_use]
    pub fn ref_count(&self, frame: impl Into<PhysicalAddress>) -> i32 {
        let addr = frame.into();
        let id = self
            .validate(addr)
            .unwrap_or_else(|e| contract_violation("ref_count", addr, &e));
        self.tables.refs.read(id)
    }

    /// Record one more owner of an allocated frame, e.g. a new shared mapping.
    ///
    /// Returns the new count.
    ///
    /// # Panics
    /// On a bad address or a frame that is currently free.
    pub fn share(&self, frame: impl Into<PhysicalAddress>) -> i32 {
        let addr = frame.into();
        let id = self
            .validate(addr)
            .unwrap_or_else(|e| contract_violation("share", addr, &e));
        self.tables
            .refs
            .increment(id)
            .unwrap_or_else(|e| contract_violation("share", addr, &e))
    }

    /// Add `delta` owners to an allocated frame without allocating or
    /// releasing it. Returns the new count.
    ///
    /// # Panics
    /// On a bad address, a frame that is currently free, or a `delta` that
    /// would remove the last owner. The last owner leaves via
    /// [`release`](Self::release).
    pub fn adjust_ref_count(&self, frame: impl Into<PhysicalAddress>, delta: i32) -> i32 {
        let addr = frame.into();
        let id = self
            .validate(addr)
            .unwrap_or_else(|e| contract_violation("adjust_ref_count", addr, &e));
        self.tables
            .refs
            .adjust(id, delta)
            .unwrap_or_else(|e| contract_violation("adjust_ref_count", addr, &e))
    }

    /// Check `addr` against the release contract without the fatal path.
    ///
    /// # Errors
    /// The address is misaligned or outside the managed range.
    pub fn validate(&self, addr: impl Into<PhysicalAddress>) -> Result<FrameId, FrameError> {
        self.range.frame_id(addr.into())
    }

    /// Scan both tables and log a summary.
    ///
    /// Takes no locks; see [`diagnostics`](crate::diagnostics) for what that
    /// means for reports taken under load.
    pub fn dump_diagnostics(&self) -> PoolReport {
        let report = diagnostics::scan(
            &self.tables.refs,
            &self.tables.pool,
            self.range.frame_count(),
        );
        if report.is_consistent() {
            info!("frame pool: {report}");
        } else {
            error!("frame pool inconsistent: {report} ({report:?})");
        }
        report
    }

    #[must_use]
    pub const fn managed_range(&self) -> &ManagedRange<S> {
        &self.range
    }

    #[must_use]
    pub const fn managed_frames(&self) -> usize {
        self.range.frame_count()
    }

    /// Free-list length; a snapshot under concurrency.
    #[must_use]
    pub fn free_frames(&self) -> usize {
        self.tables.pool.recorded_len()
    }

    #[must_use]
    pub const fn fill_patterns(&self) -> FillPatterns {
        self.fill
    }
}

impl<M, const N: usize, S: PageSize> fmt::Debug for FrameAllocator<'_, M, N, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAllocator")
            .field("range", &self.range)
            .field("capacity", &N)
            .field("free", &self.tables.pool.recorded_len())
            .finish_non_exhaustive()
    }
}

#[cold]
#[track_caller]
fn contract_violation(op: &str, addr: PhysicalAddress, err: &dyn fmt::Display) -> ! {
    error!("{op}({addr}): {err}");
    panic!("{op}({addr}): {err}");
}

#[cold]
#[track_caller]
fn corruption(op: &str, addr: PhysicalAddress, err: &RefCountError) -> ! {
    error!("{op}({addr}): frame tables corrupt: {err}");
    panic!("{op}({addr}): frame tables corrupt: {err}");
}
