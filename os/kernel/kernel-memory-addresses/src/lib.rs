//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for physical addresses and page bases used by the
//! physical memory manager.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PhysicalAddress`] | A raw 64-bit physical address. |
//! | [`PhysicalPage<S>`] | A page-aligned base address of a page of size `S`. |
//! | [`PageSize`] | Marker trait; [`Size4K`] and [`Size2M`] are provided. |
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0000_0010_2000_0042);
//! let page = pa.page::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x0000_0010_2000_0000);
//! assert!(page.base().is_aligned::<Size4K>());
//! ```
//!
//! The types are `#[repr(transparent)]`, `Copy`, `Eq`, `Ord` and `Hash`, and
//! all alignment arithmetic is `const fn`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page_size;
mod physical_address;
mod physical_page;

pub use page_size::{PageSize, Size2M, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
