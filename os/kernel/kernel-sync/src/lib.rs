//! # Kernel synchronization primitives
//!
//! Busy-wait primitives for code that must never sleep while holding a lock:
//!
//! - [`SpinLock<T>`]: test-and-test-and-set spin lock with an RAII guard.
//!   Locks carry a static name so diagnostics can say which one is held.
//! - [`SyncOnceCell<T>`]: one-time publication of a value shared for the rest
//!   of the kernel's lifetime.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;
mod sync_once_cell;

pub use spin_lock::{SpinLock, SpinLockGuard};
pub use sync_once_cell::SyncOnceCell;
