use crate::range::FrameId;
use kernel_memory_addresses::PhysicalAddress;

/// An address that cannot name a managed frame.
///
/// Handing such an address to [`release`](crate::FrameAllocator::release) is a
/// caller bug and is fatal there; [`validate`](crate::FrameAllocator::validate)
/// reports it as this error instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame address {addr} is not {page_size}-byte aligned")]
    Misaligned {
        addr: PhysicalAddress,
        page_size: u64,
    },
    #[error("frame address {addr} is outside the managed range [{start}, {end})")]
    OutOfRange {
        addr: PhysicalAddress,
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
}

/// An ownership-count transition that would break the pool's invariants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefCountError {
    #[error("ownership count underflow on frame {frame} (released while free)")]
    Underflow { frame: FrameId },
    #[error("frame {frame} left the free list with ownership count {count}")]
    NotFree { frame: FrameId, count: i32 },
    #[error("frame {frame} is not allocated (ownership count {count})")]
    NotAllocated { frame: FrameId, count: i32 },
    #[error("adjusting frame {frame} by {delta} would drop its last owner; release it instead")]
    LastOwner { frame: FrameId, delta: i32 },
    #[error("ownership count overflow on frame {frame}")]
    Overflow { frame: FrameId },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("range [{start}, {end}) does not cover a single whole frame")]
    EmptyRange {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("range covers {frames} frames but the ownership table holds {capacity}")]
    CapacityExceeded { frames: u64, capacity: usize },
    #[error("frame tables are already owned by an allocator")]
    AlreadyInitialized,
    #[error("fresh and stale fill patterns are both {0:#04x}")]
    IdenticalFillPatterns(u8),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("out of physical frames ({managed} managed)")]
    Exhausted { managed: usize },
}
