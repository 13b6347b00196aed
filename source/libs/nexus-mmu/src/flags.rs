// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Permission and status bits of an Sv32/Sv39 PTE.
//!
//! The low ten bits of an entry are laid out identically in both schemes:
//!
//! ```text
//!   9   8   7   6   5   4   3   2   1   0
//! +-------+---+---+---+---+---+---+---+---+
//! |  RSW  | D | A | G | U | X | W | R | V |
//! +-------+---+---+---+---+---+---+---+---+
//! ```
//!
//! No combination is rejected here. Whether e.g. write-without-read is legal
//! is the mapper's policy.

use bitflags::bitflags;

use crate::error::{Field, MmuError};
use crate::pte::Pte;
use crate::scheme::{check_range, PagingScheme};
use crate::types::FrameNumber;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    /// Flag field of a PTE.
    pub struct PteFlags: u16 {
        const VALID = 1 << 0;
        const READ = 1 << 1;
        const WRITE = 1 << 2;
        const EXECUTE = 1 << 3;
        const USER = 1 << 4;
        const GLOBAL = 1 << 5;
        const ACCESSED = 1 << 6;
        const DIRTY = 1 << 7;
        /// Two bits reserved for supervisor software.
        const SOFTWARE = 0b11 << 8;
    }
}

const SOFTWARE_SHIFT: u32 = 8;

impl PteFlags {
    /// Non-leaf entry pointing at the next table.
    pub const PAGE_TABLE_DIRECTORY: Self = Self::VALID;
    pub const READ_ONLY: Self = Self::VALID.union(Self::READ);
    pub const READ_WRITE: Self = Self::READ_ONLY.union(Self::WRITE);
    pub const EXECUTE_ONLY: Self = Self::VALID.union(Self::EXECUTE);
    pub const READ_EXECUTE: Self = Self::READ_ONLY.union(Self::EXECUTE);
    pub const READ_WRITE_EXECUTE: Self = Self::READ_WRITE.union(Self::EXECUTE);
    /// Everything a user-mode mapping can be granted.
    pub const USER_ALL: Self = Self::READ_WRITE_EXECUTE.union(Self::USER);

    /// Any of these set on a valid entry makes it a leaf.
    pub const LEAF_PERMS: Self = Self::READ.union(Self::WRITE).union(Self::EXECUTE);

    /// OR of the given single-bit flags.
    pub const fn compose(flags: &[Flag]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < flags.len() {
            bits |= flags[i].bits();
            i += 1;
        }
        Self::from_bits_retain(bits)
    }

    #[inline]
    pub const fn has(self, flag: Flag) -> bool {
        self.bits() & flag.bits() != 0
    }

    /// Valid and carrying at least one of R/W/X.
    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.contains(Self::VALID) && self.intersects(Self::LEAF_PERMS)
    }

    /// Value of the two software bits, `0..=3`.
    #[inline]
    pub const fn software(self) -> u8 {
        ((self.bits() & Self::SOFTWARE.bits()) >> SOFTWARE_SHIFT) as u8
    }

    /// Replaces the software bits, rejecting values wider than two bits.
    pub fn with_software(self, value: u8) -> Result<Self, MmuError> {
        check_range("pte", Field::Software, value as u64, 4)?;
        let bits = (self.bits() & !Self::SOFTWARE.bits()) | ((value as u16) << SOFTWARE_SHIFT);
        Ok(Self::from_bits_retain(bits))
    }

    /// Packs `frame` above these flags into an entry for scheme `S`.
    #[inline]
    #[track_caller]
    pub fn with_frame<S: PagingScheme>(self, frame: FrameNumber<S>) -> Pte<S> {
        Pte::new(frame, self)
    }
}

/// A single permission or status bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Flag {
    Valid = 1 << 0,
    Read = 1 << 1,
    Write = 1 << 2,
    Execute = 1 << 3,
    User = 1 << 4,
    Global = 1 << 5,
    Accessed = 1 << 6,
    Dirty = 1 << 7,
}

impl Flag {
    /// All flags in bit order.
    pub const ALL: [Flag; 8] = [
        Flag::Valid,
        Flag::Read,
        Flag::Write,
        Flag::Execute,
        Flag::User,
        Flag::Global,
        Flag::Accessed,
        Flag::Dirty,
    ];

    #[inline]
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

impl From<Flag> for PteFlags {
    #[inline]
    fn from(flag: Flag) -> Self {
        Self::from_bits_retain(flag.bits())
    }
}

impl FromIterator<Flag> for PteFlags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |acc, flag| acc | Self::from(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::{Flag, PteFlags};

    #[test]
    fn presets_match_hardware_encoding() {
        assert_eq!(PteFlags::PAGE_TABLE_DIRECTORY.bits(), 0x001);
        assert_eq!(PteFlags::READ_ONLY.bits(), 0x003);
        assert_eq!(PteFlags::READ_WRITE.bits(), 0x007);
        assert_eq!(PteFlags::EXECUTE_ONLY.bits(), 0x009);
        assert_eq!(PteFlags::READ_EXECUTE.bits(), 0x00b);
        assert_eq!(PteFlags::READ_WRITE_EXECUTE.bits(), 0x00f);
        assert_eq!(PteFlags::USER_ALL.bits(), 0x01f);
        assert_eq!(PteFlags::SOFTWARE.bits(), 0x300);
    }

    #[test]
    fn flag_bits_are_distinct_powers_of_two() {
        for (bit, flag) in Flag::ALL.iter().enumerate() {
            assert_eq!(flag.bits(), 1 << bit);
        }
    }

    #[test]
    fn compose_is_bitwise_or() {
        assert_eq!(PteFlags::compose(&[]), PteFlags::empty());
        assert_eq!(PteFlags::compose(&[Flag::Valid, Flag::Read, Flag::Write]), PteFlags::READ_WRITE);
        assert_eq!(PteFlags::compose(&[Flag::Read, Flag::Read, Flag::Valid]), PteFlags::READ_ONLY);
        let collected: PteFlags = [Flag::Execute, Flag::Valid].into_iter().collect();
        assert_eq!(collected, PteFlags::EXECUTE_ONLY);
    }

    #[test]
    fn containment() {
        assert!(PteFlags::READ_WRITE_EXECUTE.has(Flag::Read));
        assert!(PteFlags::READ_WRITE_EXECUTE.has(Flag::Write));
        assert!(PteFlags::READ_WRITE_EXECUTE.has(Flag::Execute));
        assert!(!PteFlags::READ_ONLY.has(Flag::Write));
        assert!(PteFlags::USER_ALL.has(Flag::User));
        assert!(!PteFlags::READ_WRITE_EXECUTE.has(Flag::User));
    }

    #[test]
    fn policy_free_combinations_are_kept() {
        let write_only = PteFlags::compose(&[Flag::Valid, Flag::Write]);
        assert_eq!(write_only.bits(), 0x005);
        assert!(write_only.is_leaf());
        assert!(!PteFlags::PAGE_TABLE_DIRECTORY.is_leaf());
        assert!(!PteFlags::READ.is_leaf());
    }

    #[test]
    fn software_field_round_trips() {
        let flags = PteFlags::READ_WRITE.with_software(2).expect("two bits");
        assert_eq!(flags.bits(), 0x207);
        assert_eq!(flags.software(), 2);
        assert_eq!(flags.with_software(0).expect("clear"), PteFlags::READ_WRITE);
        assert!(PteFlags::READ_WRITE.with_software(4).is_err());
    }
}
