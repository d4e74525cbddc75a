use crate::error::BuildError;
use crate::phys_mapper::PhysMapper;
use kernel_memory_addresses::{PageSize, PhysicalPage};

/// Byte written over a frame when it is handed out.
pub const FRESH_FILL: u8 = 0x05;

/// Byte written over a frame when it returns to the free list.
pub const STALE_FILL: u8 = 0x01;

/// The two junk patterns frames are filled with.
///
/// A caller reading memory it never wrote sees `fresh`; one still touching a
/// frame after releasing it sees `stale`. Keeping them distinct tells the two
/// bugs apart.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FillPatterns {
    pub fresh: u8,
    pub stale: u8,
}

impl FillPatterns {
    pub const DEFAULT: Self = Self {
        fresh: FRESH_FILL,
        stale: STALE_FILL,
    };

    pub(crate) const fn validate(self) -> Result<Self, BuildError> {
        if self.fresh == self.stale {
            return Err(BuildError::IdenticalFillPatterns(self.fresh));
        }
        Ok(self)
    }
}

impl Default for FillPatterns {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Overwrite every byte of `frame` with `byte`.
///
/// # Safety
/// `frame` must be mapped writable through `mapper`, and no other context may
/// be accessing it.
#[allow(clippy::cast_possible_truncation)]
pub(crate) unsafe fn fill_frame<M: PhysMapper, S: PageSize>(
    mapper: &M,
    frame: PhysicalPage<S>,
    byte: u8,
) {
    unsafe {
        let ptr = mapper.phys_to_ptr(frame.base());
        core::ptr::write_bytes(ptr, byte, frame.size() as usize);
    }
}
