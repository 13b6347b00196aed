// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-table entry words.
//!
//! A PTE is a flat word: flags in bits 0..10, the PPN from bit 10 upward.
//! Sv32 entries are 32 bits with a 22-bit PPN, Sv39 entries 64 bits with a
//! 44-bit PPN and ten reserved bits on top.

use core::fmt;

use crate::error::{Field, MmuError};
use crate::flags::{Flag, PteFlags};
use crate::scheme::{
    check_range, enforce, entry_frame_address, PagingScheme, PTE_FLAG_BITS, PTE_PPN_SHIFT,
};
use crate::types::{FrameNumber, PhysAddr};
use crate::word::Word;

const FLAG_MASK: u64 = (1 << PTE_FLAG_BITS) - 1;

/// Raw page-table entry of scheme `S`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Pte<S: PagingScheme>(S::Word);

impl<S: PagingScheme> Pte<S> {
    #[inline]
    pub const fn from_raw(raw: S::Word) -> Self {
        Self(raw)
    }

    /// Packs `frame` at [`PTE_PPN_SHIFT`] above `flags`.
    ///
    /// The frame must fit `S::PPN_BITS`; this is asserted only when range
    /// checks are compiled in.
    #[inline]
    #[track_caller]
    pub fn new(frame: FrameNumber<S>, flags: PteFlags) -> Self {
        enforce(S::NAME, || check_frame::<S>(frame));
        Self::pack(frame, flags)
    }

    /// Validating form of [`Pte::new`].
    pub fn try_new(frame: FrameNumber<S>, flags: PteFlags) -> Result<Self, MmuError> {
        check_frame::<S>(frame)?;
        Ok(Self::pack(frame, flags))
    }

    /// Non-leaf entry pointing at the table stored in `frame`.
    #[inline]
    #[track_caller]
    pub fn table(frame: FrameNumber<S>) -> Self {
        Self::new(frame, PteFlags::PAGE_TABLE_DIRECTORY)
    }

    #[inline]
    pub fn raw(self) -> S::Word {
        self.0
    }

    #[inline]
    pub fn flags(self) -> PteFlags {
        PteFlags::from_bits_truncate((self.0.widen() & FLAG_MASK) as u16)
    }

    /// Keeps the frame field and replaces the flag field.
    #[inline]
    pub fn with_flags(self, flags: PteFlags) -> Self {
        let raw = (self.0.widen() & !FLAG_MASK) | flags.bits() as u64;
        Self(S::Word::truncate(raw))
    }

    /// PPN field, with reserved bits above it dropped.
    #[inline]
    pub fn frame_number(self) -> FrameNumber<S> {
        FrameNumber::from_raw((self.0.widen() >> PTE_PPN_SHIFT) & S::PPN_MASK)
    }

    /// Byte address of the frame named by the PPN field.
    #[inline]
    pub fn frame_address(self) -> PhysAddr<S> {
        self.frame_number().address()
    }

    /// Scheme re-alignment of the raw entry, see [`entry_frame_address`].
    #[inline]
    pub fn entry_frame_address(self) -> PhysAddr<S> {
        entry_frame_address(self)
    }

    #[inline]
    pub fn has(self, flag: Flag) -> bool {
        self.flags().has(flag)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.has(Flag::Valid)
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.flags().is_leaf()
    }

    /// Valid entry that points at another table.
    #[inline]
    pub fn is_table(self) -> bool {
        self.is_valid() && !self.flags().intersects(PteFlags::LEAF_PERMS)
    }

    fn pack(frame: FrameNumber<S>, flags: PteFlags) -> Self {
        Self(S::Word::truncate((frame.raw() << PTE_PPN_SHIFT) | flags.bits() as u64))
    }
}

fn check_frame<S: PagingScheme>(frame: FrameNumber<S>) -> Result<(), MmuError> {
    check_range(S::NAME, Field::FrameNumber, frame.raw(), S::PPN_MASK + 1)
}

impl<S: PagingScheme> fmt::Debug for Pte<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pte")
            .field("scheme", &S::NAME)
            .field("frame", &self.frame_number())
            .field("flags", &self.flags())
            .finish()
    }
}

impl<S: PagingScheme> fmt::LowerHex for Pte<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
