// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Newtypes for addresses, indices, offsets and frame numbers.
//!
//! Each wrapper is `#[repr(transparent)]` over the raw integer, so using them
//! costs nothing over the bare shift-and-mask; what they buy is that an
//! `Index<Sv32>` cannot be handed to code expecting a `FrameNumber<Sv39>`.

use core::fmt;
use core::marker::PhantomData;

use crate::error::{Field, MmuError};
use crate::scheme::{check_range, index, Level, PagingScheme, PAGE_SHIFT, PAGE_SIZE};
use crate::word::Word;

const PAGE_MASK: u64 = PAGE_SIZE as u64 - 1;

/// Linear address translated by scheme `S`.
///
/// Any bit pattern of the scheme's word is accepted.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr<S: PagingScheme>(S::Word);

impl<S: PagingScheme> VirtAddr<S> {
    #[inline]
    pub const fn new(raw: S::Word) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> S::Word {
        self.0
    }

    #[inline]
    pub fn widen(self) -> u64 {
        self.0.widen()
    }

    /// Index of `level` within this address.
    #[inline]
    pub fn index(self, level: Level) -> Index<S> {
        index(self, level)
    }

    /// Byte offset within the 4 KiB page.
    #[inline]
    pub fn page_offset(self) -> PageOffset {
        PageOffset::from_raw((self.widen() & PAGE_MASK) as usize)
    }

    /// Every bit above the page offset (the combined VPN).
    #[inline]
    pub fn page_number(self) -> FrameNumber<S> {
        FrameNumber::from_raw(self.widen() >> PAGE_SHIFT)
    }

    #[inline]
    pub fn is_page_aligned(self) -> bool {
        self.widen() & PAGE_MASK == 0
    }

    #[inline]
    pub fn align_down(self) -> Self {
        Self(S::Word::truncate(self.widen() & !PAGE_MASK))
    }

    /// Rounds up to the next page boundary, or `None` if that overflows the word.
    pub fn checked_align_up(self) -> Option<Self> {
        let up = self.widen().checked_add(PAGE_MASK)? & !PAGE_MASK;
        let narrowed = S::Word::truncate(up);
        (narrowed.widen() == up).then_some(Self(narrowed))
    }

    /// Returns true if the address lies in the scheme's translatable range.
    #[inline]
    pub fn is_canonical(self) -> bool {
        S::is_canonical(self.widen())
    }
}

impl<S: PagingScheme> fmt::Debug for VirtAddr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr<{}>({:#x})", S::NAME, self.0)
    }
}

impl<S: PagingScheme> fmt::Display for VirtAddr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl<S: PagingScheme> fmt::LowerHex for VirtAddr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Physical byte address reachable under scheme `S`.
///
/// Always carried in 64 bits: Sv32 reaches a 34-bit physical space.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr<S: PagingScheme> {
    raw: u64,
    _scheme: PhantomData<S>,
}

impl<S: PagingScheme> PhysAddr<S> {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self { raw, _scheme: PhantomData }
    }

    /// Byte address of the first byte of `frame`.
    #[inline]
    pub const fn from_frame(frame: FrameNumber<S>) -> Self {
        Self::from_raw(frame.raw() << PAGE_SHIFT)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.raw
    }

    #[inline]
    pub const fn frame_number(self) -> FrameNumber<S> {
        FrameNumber::from_raw(self.raw >> PAGE_SHIFT)
    }

    #[inline]
    pub const fn page_offset(self) -> PageOffset {
        PageOffset::from_raw((self.raw & PAGE_MASK) as usize)
    }

    #[inline]
    pub const fn is_page_aligned(self) -> bool {
        self.raw & PAGE_MASK == 0
    }
}

impl<S: PagingScheme> fmt::Debug for PhysAddr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr<{}>({:#x})", S::NAME, self.raw)
    }
}

impl<S: PagingScheme> fmt::Display for PhysAddr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}

/// Position within one page-table level of scheme `S`.
///
/// `from_raw` trusts the caller; [`Index::new`] enforces
/// `0 <= index < S::ENTRIES_PER_LEVEL`. Indices produced by the extractors are
/// always in range.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Index<S: PagingScheme> {
    raw: usize,
    _scheme: PhantomData<S>,
}

impl<S: PagingScheme> Index<S> {
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self { raw, _scheme: PhantomData }
    }

    pub fn new(raw: usize) -> Result<Self, MmuError> {
        check_range(S::NAME, Field::Index, raw as u64, S::ENTRIES_PER_LEVEL as u64)?;
        Ok(Self::from_raw(raw))
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.raw
    }

    #[inline]
    pub const fn widen(self) -> u64 {
        self.raw as u64
    }

    /// Byte offset of this entry inside its table page.
    #[inline]
    pub const fn byte_offset(self) -> usize {
        self.raw * S::ENTRY_SIZE
    }
}

impl<S: PagingScheme> fmt::Debug for Index<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index<{}>({})", S::NAME, self.raw)
    }
}

impl<S: PagingScheme> fmt::Display for Index<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Byte offset within a 4 KiB page, `0..PAGE_SIZE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PageOffset(usize);

impl PageOffset {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn new(raw: usize) -> Result<Self, MmuError> {
        check_range("page", Field::PageOffset, raw as u64, PAGE_SIZE as u64)?;
        Ok(Self(raw))
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn widen(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Physical page frame number under scheme `S` (22 bits for Sv32, 44 for Sv39).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FrameNumber<S: PagingScheme> {
    raw: u64,
    _scheme: PhantomData<S>,
}

impl<S: PagingScheme> FrameNumber<S> {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self { raw, _scheme: PhantomData }
    }

    /// Accepts only frames that fit the PPN field of a PTE.
    pub fn new(raw: u64) -> Result<Self, MmuError> {
        check_range(S::NAME, Field::FrameNumber, raw, S::PPN_MASK + 1)?;
        Ok(Self::from_raw(raw))
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.raw
    }

    /// Byte address of the frame's first byte.
    #[inline]
    pub const fn address(self) -> PhysAddr<S> {
        PhysAddr::from_frame(self)
    }
}

impl<S: PagingScheme> fmt::Debug for FrameNumber<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameNumber<{}>({:#x})", S::NAME, self.raw)
    }
}

impl<S: PagingScheme> fmt::Display for FrameNumber<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}
