//! Mapping between physical addresses and dense frame identifiers.

use crate::error::{BuildError, FrameError};
use core::fmt;
use core::marker::PhantomData;
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage};

/// Dense index of a managed frame: `(address - managed_start) / page_size`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(u32);

impl FrameId {
    #[inline]
    #[must_use]
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The whole frames between a page-rounded start and a range end.
///
/// A trailing partial page is not part of the range.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ManagedRange<S: PageSize> {
    start: PhysicalAddress,
    frames: u32,
    _size: PhantomData<S>,
}

impl<S: PageSize> ManagedRange<S> {
    /// Rounds `range_start` up to a page boundary and covers every whole page
    /// below `range_end`.
    ///
    /// # Errors
    /// [`BuildError::EmptyRange`] if no whole frame fits, and
    /// [`BuildError::CapacityExceeded`] if more than `capacity` frames do.
    pub fn covering(
        range_start: PhysicalAddress,
        range_end: PhysicalAddress,
        capacity: usize,
    ) -> Result<Self, BuildError> {
        let empty = BuildError::EmptyRange {
            start: range_start,
            end: range_end,
        };
        let start = range_start.align_up::<S>().ok_or(empty)?;
        let frames = range_end.checked_offset_from(start).unwrap_or(0) >> S::SHIFT;
        if frames == 0 {
            return Err(empty);
        }

        let exceeded = BuildError::CapacityExceeded { frames, capacity };
        if !usize::try_from(frames).is_ok_and(|n| n <= capacity) {
            return Err(exceeded);
        }
        let frames = u32::try_from(frames).map_err(|_| exceeded)?;

        Ok(Self {
            start,
            frames,
            _size: PhantomData,
        })
    }

    /// First managed byte (page aligned).
    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    /// One past the last managed byte.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start.as_u64() + ((self.frames as u64) << S::SHIFT))
    }

    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frames as usize
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, addr: PhysicalAddress) -> bool {
        self.start <= addr && addr < self.end()
    }

    /// Identifier of the frame starting at `addr`.
    ///
    /// # Errors
    /// The address is not page aligned, or not inside the range.
    pub fn frame_id(&self, addr: PhysicalAddress) -> Result<FrameId, FrameError> {
        if !addr.is_aligned::<S>() {
            return Err(FrameError::Misaligned {
                addr,
                page_size: S::SIZE,
            });
        }
        match addr.checked_offset_from(self.start) {
            Some(offset) if self.contains(addr) => {
                // Bounded by `frames`, which fits a u32.
                #[allow(clippy::cast_possible_truncation)]
                Ok(FrameId::new((offset >> S::SHIFT) as u32))
            }
            _ => Err(FrameError::OutOfRange {
                addr,
                start: self.start,
                end: self.end(),
            }),
        }
    }

    /// The frame named by `id`. `id` must come from this range.
    #[inline]
    #[must_use]
    pub fn frame(&self, id: FrameId) -> PhysicalPage<S> {
        debug_assert!(id.as_u32() < self.frames, "frame {id} outside range");
        PhysicalPage::from_addr(self.start + (u64::from(id.as_u32()) << S::SHIFT))
    }

    /// All frame identifiers, lowest address first.
    pub fn ids(&self) -> impl Iterator<Item = FrameId> + use<S> {
        (0..self.frames).map(FrameId::new)
    }
}

impl<S: PageSize> fmt::Debug for ManagedRange<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManagedRange<{}>([{}, {}), {} frames)",
            S::as_str(),
            self.start,
            self.end(),
            self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::Size4K;

    fn pa(v: u64) -> PhysicalAddress {
        PhysicalAddress::new(v)
    }

    #[test]
    fn rounds_start_up_and_drops_partial_tail() {
        let r = ManagedRange::<Size4K>::covering(pa(0x1001), pa(0x5800), 16).unwrap();
        assert_eq!(r.start(), pa(0x2000));
        assert_eq!(r.end(), pa(0x5000));
        assert_eq!(r.frame_count(), 3);
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        assert!(matches!(
            ManagedRange::<Size4K>::covering(pa(0x1001), pa(0x2FFF), 16),
            Err(BuildError::EmptyRange { .. })
        ));
        assert!(matches!(
            ManagedRange::<Size4K>::covering(pa(0x9000), pa(0x1000), 16),
            Err(BuildError::EmptyRange { .. })
        ));
    }

    #[test]
    fn capacity_is_enforced() {
        assert_eq!(
            ManagedRange::<Size4K>::covering(pa(0), pa(0x5000), 4),
            Err(BuildError::CapacityExceeded {
                frames: 5,
                capacity: 4
            })
        );
    }

    #[test]
    fn frame_ids_map_both_ways() {
        let r = ManagedRange::<Size4K>::covering(pa(0x10_0000), pa(0x10_4000), 4).unwrap();
        let id = r.frame_id(pa(0x10_2000)).unwrap();
        assert_eq!(id.index(), 2);
        assert_eq!(r.frame(id).base(), pa(0x10_2000));
        assert_eq!(r.ids().count(), 4);
    }

    #[test]
    fn frame_id_rejects_bad_addresses() {
        let r = ManagedRange::<Size4K>::covering(pa(0x10_0000), pa(0x10_4000), 4).unwrap();
        assert!(matches!(r.frame_id(pa(0x10_0001)), Err(FrameError::Misaligned { .. })));
        assert!(matches!(r.frame_id(pa(0x0F_F000)), Err(FrameError::OutOfRange { .. })));
        assert!(matches!(r.frame_id(pa(0x10_4000)), Err(FrameError::OutOfRange { .. })));
    }
}
