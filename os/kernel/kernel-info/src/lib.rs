//! # Kernel Memory Configuration
//!
//! Compile-time layout constants shared by the kernel and its memory
//! subsystem. This crate is the single source of truth for where physical
//! memory is visible to the kernel and how many frames the physical memory
//! manager must be able to track.
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             ├─────────────────────────────────┤ first free address
//!             │    Available RAM                │
//!             │  (Managed by kernel-pmm)        │
//! PHYS_MEM_SIZE └───────────────────────────────┘
//! ```
//!
//! The managed range itself is a boot-time parameter: the start is the first
//! free address after the kernel image and the end is the top of physical
//! memory. [`MAX_PHYS_FRAMES`](memory::MAX_PHYS_FRAMES) bounds how many frames
//! that range may contain.
//!
//! ```rust
//! use kernel_info::memory::{MAX_PHYS_FRAMES, PAGE_SIZE, PHYS_MEM_SIZE};
//!
//! assert_eq!(MAX_PHYS_FRAMES as u64 * PAGE_SIZE, PHYS_MEM_SIZE);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
