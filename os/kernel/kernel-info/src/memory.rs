//! # Memory Layout

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Base page size used by the physical memory manager.
pub const PAGE_SIZE: u64 = 4096;

/// Amount of physical memory the kernel is configured for.
pub const PHYS_MEM_SIZE: u64 = 128 * 1024 * 1024; // 128 MiB

/// Top of physical memory; the managed range never extends past this.
pub const PHYS_MEM_TOP: u64 = PHYS_MEM_SIZE;

/// Capacity of the frame ownership table.
///
/// One slot per page of [`PHYS_MEM_SIZE`], whether or not the page ends up
/// in the managed range.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_PHYS_FRAMES: usize = (PHYS_MEM_SIZE / PAGE_SIZE) as usize;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(PHYS_MEM_SIZE.is_multiple_of(PAGE_SIZE));
    assert!(MAX_PHYS_FRAMES < u32::MAX as usize);
};
