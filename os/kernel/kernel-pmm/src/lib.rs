//! # Kernel Physical Memory Manager
//!
//! Hands out whole physical frames and tracks how many logical owners (for
//! example copy-on-write mappings) each frame has. A frame returns to the
//! pool only when its last owner releases it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 FrameAllocator                      │
//! │   allocate · release · share · adjust_ref_count     │
//! └───────────┬─────────────────────────────┬───────────┘
//!             │ pool lock (outer)           │ refcnt lock (inner)
//! ┌───────────▼───────────┐     ┌───────────▼───────────┐
//! │   FreeList<N>         │     │   OwnershipTable<N>   │
//! │   LIFO, index-linked  │     │   i32 per frame id    │
//! └───────────┬───────────┘     └───────────┬───────────┘
//!             └──────────┐       ┌──────────┘
//!                 ┌──────▼───────▼──────┐
//!                 │     diagnostics     │
//!                 │  lock-free scan     │
//!                 └─────────────────────┘
//! ```
//!
//! ## Frame states
//!
//! | State | Ownership count | On free list |
//! |-------|-----------------|--------------|
//! | Free | 0 | yes |
//! | Allocated | 1 | no |
//! | Shared | > 1 | no |
//!
//! `allocate` moves a frame from Free to Allocated, `share` and
//! `adjust_ref_count` move between Allocated and Shared, and `release` drops
//! one owner, returning the frame to Free with the last one.
//!
//! ## Failure model
//!
//! Running out of frames is an ordinary outcome: `allocate` returns `None`.
//! Handing the allocator an address it does not manage, releasing a free
//! frame, or removing a frame's last owner through `adjust_ref_count` are
//! caller bugs and panic on the spot.
//!
//! ## Content hygiene
//!
//! Frames are filled with [`FRESH_FILL`] when handed out and [`STALE_FILL`]
//! when they return to the pool, so reads of uninitialized or released memory
//! show up as recognizable junk.
//!
//! ## Locking
//!
//! All locks are [`kernel_sync::SpinLock`]s held for O(1) work, except while
//! a released frame is filled. The pool lock is always the outer one.
//! Diagnostics take no lock at all.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod diagnostics;
mod error;
mod fill;
mod frame_alloc;
mod free_list;
pub mod global;
pub mod phys_mapper;
mod range;
mod ref_count;

pub use diagnostics::PoolReport;
pub use error::{AllocError, BuildError, FrameError, RefCountError};
pub use fill::{FRESH_FILL, FillPatterns, STALE_FILL};
pub use frame_alloc::{FrameAllocator, FrameAllocatorBuilder, FrameTables};
pub use phys_mapper::{IdentityPhysMapper, OffsetPhysMapper, PhysMapper};
pub use range::{FrameId, ManagedRange};
