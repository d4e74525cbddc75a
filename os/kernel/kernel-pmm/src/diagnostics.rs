//! Best-effort consistency scan over the frame pool and ownership table.
//!
//! The scan never takes or waits for either lock. It reads the atomically
//! stored counts and free-list links directly, so a report taken while other
//! contexts allocate or release is a torn snapshot; only a report taken at a
//! quiescent point is expected to be [consistent](PoolReport::is_consistent).

use crate::free_list::FreeList;
use crate::ref_count::OwnershipTable;
use core::fmt;
use log::error;

/// Summary of the pool state produced by
/// [`dump_diagnostics`](crate::FrameAllocator::dump_diagnostics).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PoolReport {
    /// Frames in the managed range.
    pub managed_frames: usize,
    /// Frames with an ownership count above zero.
    pub live_frames: usize,
    /// Sum of all positive ownership counts.
    pub total_refs: u64,
    /// Nodes reached by walking the free list.
    pub free_frames: usize,
    /// Free-list length as maintained by push/pop.
    pub recorded_free_frames: usize,
    /// Slots holding a negative count.
    pub negative_counts: usize,
    /// Slots outside the managed range holding a non-zero count or linked
    /// into the free list.
    pub stray_counts: usize,
    /// Free-list nodes whose frame has a non-zero ownership count.
    pub owned_on_free_list: usize,
    /// The free-list walk found a cycle or an out-of-table link.
    pub free_list_corrupt: bool,
}

impl PoolReport {
    /// Whether every managed frame is either free or owned, exactly once.
    ///
    /// No free-list node may carry an owner, and owned plus free frames must
    /// add up to the managed range. Together these rule out a frame that is
    /// both linked and owned as well as one that is neither.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.negative_counts == 0
            && self.stray_counts == 0
            && self.owned_on_free_list == 0
            && !self.free_list_corrupt
            && self.free_frames == self.recorded_free_frames
            && self.live_frames + self.free_frames == self.managed_frames
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "live frames: {}, total refs: {}, free: {} of {}",
            self.live_frames, self.total_refs, self.free_frames, self.managed_frames
        )
    }
}

pub(crate) fn scan<const N: usize>(
    table: &OwnershipTable<N>,
    pool: &FreeList<N>,
    managed_frames: usize,
) -> PoolReport {
    let mut report = PoolReport {
        managed_frames,
        live_frames: 0,
        total_refs: 0,
        free_frames: 0,
        recorded_free_frames: pool.recorded_len(),
        negative_counts: 0,
        stray_counts: 0,
        owned_on_free_list: 0,
        free_list_corrupt: false,
    };

    for (frame, count) in table.snapshot() {
        if count < 0 {
            error!("frame {frame}: negative ownership count {count}");
            report.negative_counts += 1;
        } else if count > 0 {
            report.live_frames += 1;
            report.total_refs += u64::from(count.unsigned_abs());
        }
        if count != 0 && frame.index() >= managed_frames {
            error!("frame {frame}: count {count} outside the managed range");
            report.stray_counts += 1;
        }
    }

    let walk = pool.walk(|frame| {
        if frame.index() >= managed_frames {
            error!("frame {frame}: on the free list outside the managed range");
            report.stray_counts += 1;
        }
        let count = table.peek(frame);
        if count != 0 {
            error!("frame {frame}: on the free list with ownership count {count}");
            report.owned_on_free_list += 1;
        }
    });
    report.free_frames = walk.len;
    report.free_list_corrupt = walk.corrupt;
    if walk.corrupt {
        error!("free list corrupt after {} nodes", walk.len);
    }

    report
}
