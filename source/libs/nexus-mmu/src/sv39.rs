// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sv39: three-level paging over a 39-bit virtual address space.
//!
//! ```text
//! +-------9--------+-------9--------+--------9---------+----------12----------+
//! |      VPN2      |      VPN1      |       VPN0       |  Offset within Page  |
//! +----------------+----------------+------------------+----------------------+
//! ```
//!
//! Entries are 64 bits: ten reserved bits, a 44-bit PPN, then the flag field.
//! A walk starts at [`PT2`] with [`vpn2`] and descends toward [`PT0`].

use static_assertions::const_assert_eq;

use crate::error::MmuError;
use crate::pte::Pte;
use crate::scheme::{self, Level, PagingScheme, PAGE_SHIFT, PAGE_SIZE};
use crate::types::{FrameNumber, Index, PageOffset, PhysAddr, VirtAddr};

/// Marker for the Sv39 layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sv39;

impl PagingScheme for Sv39 {
    type Word = u64;

    const NAME: &'static str = "Sv39";
    const LEVELS: usize = 3;
    const INDEX_BITS: u32 = 9;
    const VA_BITS: u32 = 39;
    const PPN_BITS: u32 = 44;
    const ENTRY_ADDR_LOW_BITS: u32 = 9;
    const ENTRY_ADDR_SHIFT: u32 = 3;

    /// Bits 63..39 must all equal bit 38.
    fn is_canonical(raw: u64) -> bool {
        let sign = (raw >> (Self::VA_BITS - 1)) & 1;
        let upper = raw >> Self::VA_BITS;
        if sign == 0 {
            upper == 0
        } else {
            upper == u64::MAX >> Self::VA_BITS
        }
    }
}

/// Leaf table level.
pub const PT0: Level = Level::L0;
/// Middle table level.
pub const PT1: Level = Level::L1;
/// Root table level.
pub const PT2: Level = Level::L2;

/// Entries per table page at every level.
pub const ENTRIES_PER_TABLE: usize = Sv39::ENTRIES_PER_LEVEL;
pub const VPN0_SHIFT: u32 = PT0.shift::<Sv39>();
pub const VPN1_SHIFT: u32 = PT1.shift::<Sv39>();
pub const VPN2_SHIFT: u32 = PT2.shift::<Sv39>();
/// Bytes mapped by one PT1 entry (a 2 MiB megapage).
pub const MEGAPAGE_SIZE: u64 = PT1.span::<Sv39>();
pub const MEGAPAGE_SHIFT: u32 = VPN1_SHIFT;
/// Bytes mapped by one PT2 entry (a 1 GiB gigapage).
pub const GIGAPAGE_SIZE: u64 = PT2.span::<Sv39>();
pub const GIGAPAGE_SHIFT: u32 = VPN2_SHIFT;

const_assert_eq!(ENTRIES_PER_TABLE, 512);
const_assert_eq!(VPN0_SHIFT, PAGE_SHIFT);
const_assert_eq!(VPN1_SHIFT, 21);
const_assert_eq!(VPN2_SHIFT, 30);
const_assert_eq!(MEGAPAGE_SIZE, PAGE_SIZE as u64 * ENTRIES_PER_TABLE as u64);
const_assert_eq!(GIGAPAGE_SIZE, MEGAPAGE_SIZE * ENTRIES_PER_TABLE as u64);
const_assert_eq!(Sv39::TABLE_SIZE, PAGE_SIZE);

/// `(va >> 12 >> 9 * level) & 0x1ff`.
#[inline]
pub fn vpn(va: VirtAddr<Sv39>, level: Level) -> Index<Sv39> {
    scheme::index(va, level)
}

#[inline]
pub fn vpn0(va: VirtAddr<Sv39>) -> Index<Sv39> {
    vpn(va, PT0)
}

#[inline]
pub fn vpn1(va: VirtAddr<Sv39>) -> Index<Sv39> {
    vpn(va, PT1)
}

#[inline]
pub fn vpn2(va: VirtAddr<Sv39>) -> Index<Sv39> {
    vpn(va, PT2)
}

#[inline]
pub fn page_offset(va: VirtAddr<Sv39>) -> PageOffset {
    va.page_offset()
}

/// `va >> 12`, including any bits above the 39-bit range.
#[inline]
pub fn page_frame_number(va: VirtAddr<Sv39>) -> FrameNumber<Sv39> {
    va.page_number()
}

/// `(v2 << 30) | (v1 << 21) | (v0 << 12) | offset`.
///
/// Only bits 0..39 are produced; upper-half addresses are not sign-extended.
#[inline]
#[track_caller]
pub fn compose_address(
    v2: Index<Sv39>,
    v1: Index<Sv39>,
    v0: Index<Sv39>,
    offset: PageOffset,
) -> VirtAddr<Sv39> {
    scheme::compose(&[v0, v1, v2], offset)
}

pub fn try_compose_address(
    v2: Index<Sv39>,
    v1: Index<Sv39>,
    v0: Index<Sv39>,
    offset: PageOffset,
) -> Result<VirtAddr<Sv39>, MmuError> {
    scheme::try_compose(&[v0, v1, v2], offset)
}

/// `(pte & !0x1ff) << 3`.
///
/// Kept bit-exact with the historical layout table: an entry packed with
/// frame `F` at bit 10 comes back as `F << 13`, and software bit 9 survives
/// the mask. Walkers that want the frame's byte address use
/// [`Pte::frame_address`].
#[inline]
pub fn entry_frame_address(pte: Pte<Sv39>) -> PhysAddr<Sv39> {
    scheme::entry_frame_address(pte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PteFlags;

    fn idx(raw: usize) -> Index<Sv39> {
        Index::from_raw(raw)
    }

    #[test]
    fn decomposes_three_levels() {
        let va = VirtAddr::new(0x0000_0040_2000_1000);
        assert_eq!(vpn2(va), idx(256));
        assert_eq!(vpn1(va), idx(256));
        assert_eq!(vpn0(va), idx(1));
        assert_eq!(page_offset(va), PageOffset::ZERO);
        assert_eq!(compose_address(idx(256), idx(256), idx(1), PageOffset::ZERO), va);
    }

    #[test]
    fn composes_from_low_indices() {
        let va = compose_address(idx(0), idx(1), idx(32), PageOffset::ZERO);
        assert_eq!(va, VirtAddr::new(0x0022_0000));
        assert_eq!((vpn2(va), vpn1(va), vpn0(va)), (idx(0), idx(1), idx(32)));
    }

    #[test]
    fn named_extractors_agree_with_generic() {
        let va = VirtAddr::new(0x7f_ffff_f123);
        assert_eq!(vpn(va, PT0), vpn0(va));
        assert_eq!(vpn(va, PT1), vpn1(va));
        assert_eq!(vpn(va, PT2), vpn2(va));
        assert_eq!(vpn2(va), idx(511));
        assert_eq!(page_frame_number(va), FrameNumber::from_raw(0x7ff_ffff));
    }

    #[test]
    fn entry_frame_address_realigns_by_three() {
        let pte = PteFlags::READ_WRITE.with_frame(FrameNumber::<Sv39>::from_raw(5));
        assert_eq!(pte.raw(), (5 << 10) | 0x7);
        assert_eq!(entry_frame_address(pte), PhysAddr::from_raw(5 << 13));
        assert_eq!(pte.frame_address(), PhysAddr::from_raw(5 << 12));

        let soft = Pte::<Sv39>::from_raw(0x200);
        assert_eq!(entry_frame_address(soft), PhysAddr::from_raw(0x1000));
    }

    #[test]
    fn canonical_addresses() {
        assert!(VirtAddr::<Sv39>::new(0).is_canonical());
        assert!(VirtAddr::<Sv39>::new(0x3f_ffff_ffff).is_canonical());
        assert!(!VirtAddr::<Sv39>::new(0x40_0000_0000).is_canonical());
        assert!(VirtAddr::<Sv39>::new(0xffff_ffc0_0000_0000).is_canonical());
        assert!(!VirtAddr::<Sv39>::new(1 << 50).is_canonical());
    }

    #[test]
    fn try_compose_rejects_wide_inputs() {
        assert!(try_compose_address(idx(512), idx(0), idx(0), PageOffset::ZERO).is_err());
        assert!(try_compose_address(idx(0), idx(0), idx(0), PageOffset::from_raw(0x1000)).is_err());
        assert_eq!(
            try_compose_address(idx(1), idx(2), idx(3), PageOffset::from_raw(4)),
            Ok(VirtAddr::new((1 << 30) | (2 << 21) | (3 << 12) | 4))
        );
    }

    #[test]
    fn page_sizes() {
        assert_eq!(MEGAPAGE_SIZE, 2 << 20);
        assert_eq!(GIGAPAGE_SIZE, 1 << 30);
        assert_eq!(PT0.span::<Sv39>(), PAGE_SIZE as u64);
        assert_eq!(Level::root::<Sv39>(), PT2);
    }
}
