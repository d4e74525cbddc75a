#![allow(dead_code)]

use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};
use kernel_pmm::{FrameAllocator, FrameAllocatorBuilder, FrameTables, IdentityPhysMapper};
use std::alloc::{Layout, alloc, dealloc};

pub const PAGE: u64 = Size4K::SIZE;

pub type TestPool<'t, const N: usize> = FrameAllocator<'t, IdentityPhysMapper, N>;

/// Page-aligned heap memory standing in for physical RAM.
///
/// Physical addresses are host addresses; frames are reached through
/// [`IdentityPhysMapper`].
pub struct Arena {
    base: *mut u8,
    layout: Layout,
}

impl Arena {
    pub fn new(pages: usize) -> Self {
        Self::aligned(pages * PAGE as usize, PAGE as usize)
    }

    /// `size` bytes starting on an `align` boundary.
    pub fn aligned(size: usize, align: usize) -> Self {
        let layout = Layout::from_size_align(size, align).unwrap();
        let base = unsafe { alloc(layout) };
        assert!(!base.is_null(), "arena allocation failed");
        Self { base, layout }
    }

    pub fn start(&self) -> PhysicalAddress {
        PhysicalAddress::from_ptr(self.base)
    }

    pub fn end(&self) -> PhysicalAddress {
        self.start() + self.layout.size() as u64
    }

    /// A pool over the whole arena.
    pub fn pool<'t, const N: usize>(&self, tables: &'t FrameTables<N>) -> TestPool<'t, N> {
        self.pool_over(tables, self.start(), self.end())
    }

    pub fn pool_over<'t, const N: usize>(
        &self,
        tables: &'t FrameTables<N>,
        start: PhysicalAddress,
        end: PhysicalAddress,
    ) -> TestPool<'t, N> {
        assert!(self.start() <= start && end <= self.end());
        unsafe { FrameAllocatorBuilder::new(start, end).build(tables, IdentityPhysMapper) }
            .expect("pool over arena")
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { dealloc(self.base, self.layout) };
    }
}

/// The bytes of a frame inside an identity-mapped arena.
pub fn frame_bytes<S: PageSize>(frame: PhysicalPage<S>) -> &'static mut [u8] {
    let ptr = core::ptr::with_exposed_provenance_mut::<u8>(frame.base().as_u64() as usize);
    unsafe { std::slice::from_raw_parts_mut(ptr, S::SIZE as usize) }
}

pub fn all_bytes_are<S: PageSize>(frame: PhysicalPage<S>, byte: u8) -> bool {
    frame_bytes(frame).iter().all(|&b| b == byte)
}
