//! # Reaching physical frames from the current address space
//!
//! The frame allocator writes fill patterns into the frames it hands out and
//! takes back, so it needs a pointer to each frame's bytes. A [`PhysMapper`]
//! turns a physical address into such a pointer:
//!
//! - [`IdentityPhysMapper`]: physical == virtual (early boot, hosted tests).
//! - [`OffsetPhysMapper`]: physical memory visible at a fixed offset, such as
//!   the kernel's higher half direct map ([`OffsetPhysMapper::hhdm`]).

use kernel_info::memory::HHDM_BASE;
use kernel_memory_addresses::PhysicalAddress;

/// Converts physical addresses to pointers usable in the current address space.
pub trait PhysMapper {
    /// Pointer to the byte at physical address `pa`.
    ///
    /// # Safety
    /// - `pa` must be mapped writable in the current page tables for at
    ///   least one whole frame starting at `pa`.
    /// - The mapping must stay valid for as long as the pointer is used.
    unsafe fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8;
}

/// [`PhysMapper`] for identity-mapped memory.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityPhysMapper;

impl PhysMapper for IdentityPhysMapper {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        core::ptr::with_exposed_provenance_mut(pa.as_u64() as usize)
    }
}

/// [`PhysMapper`] for physical memory mapped at a constant virtual offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OffsetPhysMapper {
    offset: u64,
}

impl OffsetPhysMapper {
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Mapper for the kernel's higher half direct map at [`HHDM_BASE`].
    #[must_use]
    pub const fn hhdm() -> Self {
        Self::new(HHDM_BASE)
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl PhysMapper for OffsetPhysMapper {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        core::ptr::with_exposed_provenance_mut(pa.as_u64().wrapping_add(self.offset) as usize)
    }
}
