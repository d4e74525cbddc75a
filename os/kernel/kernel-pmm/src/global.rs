//! The kernel's physical memory manager instance.
//!
//! Boot code calls [`init_kernel_pmm`] once with the free range it was handed;
//! afterwards every subsystem reaches the same allocator through
//! [`kernel_pmm`].

use crate::error::BuildError;
use crate::frame_alloc::{FrameAllocator, FrameAllocatorBuilder, FrameTables};
use crate::phys_mapper::OffsetPhysMapper;
use kernel_info::memory::{MAX_PHYS_FRAMES, PAGE_SIZE, PHYS_MEM_TOP};
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K};
use kernel_sync::SyncOnceCell;

pub type KernelFrameAllocator = FrameAllocator<'static, OffsetPhysMapper, MAX_PHYS_FRAMES>;

const _: () = assert!(Size4K::SIZE == PAGE_SIZE);

static KERNEL_FRAME_TABLES: FrameTables<MAX_PHYS_FRAMES> = FrameTables::new();
static KERNEL_PMM: SyncOnceCell<KernelFrameAllocator> = SyncOnceCell::new();

/// The range the kernel manages: from the end of its image to the top of
/// configured physical memory.
#[must_use]
pub const fn kernel_managed_range(image_end: PhysicalAddress) -> (PhysicalAddress, PhysicalAddress) {
    (image_end, PhysicalAddress::new(PHYS_MEM_TOP))
}

/// Set up the kernel frame pool over `[range_start, range_end)`.
///
/// # Safety
/// Same contract as [`FrameAllocatorBuilder::build`]: the range must be free
/// RAM, reachable through `mapper` (normally [`OffsetPhysMapper::hhdm`]) for
/// the rest of the kernel's life.
///
/// # Errors
/// [`BuildError::AlreadyInitialized`] on a second call; otherwise whatever
/// the builder rejects.
pub unsafe fn init_kernel_pmm(
    range_start: PhysicalAddress,
    range_end: PhysicalAddress,
    mapper: OffsetPhysMapper,
) -> Result<&'static KernelFrameAllocator, BuildError> {
    let pmm = unsafe {
        FrameAllocatorBuilder::new(range_start, range_end).build(&KERNEL_FRAME_TABLES, mapper)?
    };
    KERNEL_PMM
        .set(pmm)
        .map_err(|_| BuildError::AlreadyInitialized)
}

#[inline]
pub fn try_kernel_pmm() -> Option<&'static KernelFrameAllocator> {
    KERNEL_PMM.get()
}

/// # Panics
/// If [`init_kernel_pmm`] has not completed.
#[inline]
pub fn kernel_pmm() -> &'static KernelFrameAllocator {
    KERNEL_PMM
        .get()
        .expect("physical memory manager not initialized")
}
