// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: N-level paging scheme description and the shared decompose/compose laws
//! OWNERS: @kernel-mm-team
//! PUBLIC API: PagingScheme, Level, index(), compose(), try_compose(),
//!             entry_frame_address(), walk_indices(), levels_root_first()
//! INVARIANTS: index(va, l) < ENTRIES_PER_LEVEL for every va;
//!             compose(indices(va), offset(va)) == va for every va in the VA_BITS domain
//!
//! Sv32 and Sv39 differ only in level count, index width and the PTE
//! re-alignment shift. Everything that depends on those numbers lives here
//! once; the scheme modules only pick the numbers and give the operations
//! their conventional names.

use core::fmt;
use core::hash::Hash;

use crate::error::{Field, MmuError};
use crate::pte::Pte;
use crate::types::{Index, PageOffset, PhysAddr, VirtAddr};
use crate::word::Word;

/// log2 of the page size shared by both schemes.
pub const PAGE_SHIFT: u32 = 12;
/// Size of a base page in bytes.
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
/// Bit position of the PPN field inside a PTE (both schemes).
pub const PTE_PPN_SHIFT: u32 = 10;
/// Width of the flag field below the PPN (8 flag bits plus 2 software bits).
pub const PTE_FLAG_BITS: u32 = 10;

/// Whether compose-style inputs are range checked before packing.
///
/// On with `debug_assertions` or the `strict-ranges` feature. When off, an
/// out-of-range input silently corrupts the neighbouring bit fields.
pub const RANGE_CHECKS: bool = cfg!(any(debug_assertions, feature = "strict-ranges"));

/// Geometry of a multi-level paging scheme.
///
/// Implementors only fill in the raw layout numbers; the derived constants
/// must not be overridden.
pub trait PagingScheme:
    Copy + Default + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static
{
    /// Integer type of virtual addresses and page-table entries.
    type Word: Word;

    /// Human readable scheme name used in diagnostics.
    const NAME: &'static str;
    /// Number of page-table levels.
    const LEVELS: usize;
    /// Width of one level's index field in a virtual address.
    const INDEX_BITS: u32;
    /// Width of the translated virtual address.
    const VA_BITS: u32;
    /// Width of the PPN field in a PTE.
    const PPN_BITS: u32;
    /// Low PTE bits cleared by [`entry_frame_address`].
    const ENTRY_ADDR_LOW_BITS: u32;
    /// Left shift applied by [`entry_frame_address`] after clearing.
    const ENTRY_ADDR_SHIFT: u32;

    /// Entries in one table page.
    const ENTRIES_PER_LEVEL: usize = 1 << Self::INDEX_BITS;
    /// Mask selecting one index after shifting it down.
    const INDEX_MASK: u64 = (1 << Self::INDEX_BITS) - 1;
    /// Mask selecting the PPN after shifting the PTE down by [`PTE_PPN_SHIFT`].
    const PPN_MASK: u64 = (1 << Self::PPN_BITS) - 1;
    /// Size of one PTE in bytes.
    const ENTRY_SIZE: usize = core::mem::size_of::<Self::Word>();
    /// Size of one table page in bytes.
    const TABLE_SIZE: usize = Self::ENTRIES_PER_LEVEL * Self::ENTRY_SIZE;

    /// Returns true when `raw` is a valid translation input for the scheme.
    fn is_canonical(raw: u64) -> bool {
        Self::VA_BITS >= u64::BITS || raw >> Self::VA_BITS == 0
    }
}

/// Depth of a page table, from the leaf (0) up to the root (`LEVELS - 1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    /// Leaf level holding 4 KiB mappings.
    pub const L0: Self = Self(0);
    /// First level above the leaf.
    pub const L1: Self = Self(1);
    /// Second level above the leaf (Sv39 root).
    pub const L2: Self = Self(2);
    /// Alias for [`Level::L0`].
    pub const LEAF: Self = Self::L0;

    /// Wraps a raw level without checking it against a scheme.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Validates `raw` against the level count of `S`.
    pub fn new<S: PagingScheme>(raw: u8) -> Result<Self, MmuError> {
        if (raw as usize) < S::LEVELS {
            return Ok(Self(raw));
        }
        log::debug!(target: "mmu", "{}: rejecting level {} ({} levels)", S::NAME, raw, S::LEVELS);
        Err(MmuError::InvalidLevel { level: raw, levels: S::LEVELS })
    }

    /// Root level of `S`, where a walk starts.
    #[inline]
    pub const fn root<S: PagingScheme>() -> Self {
        Self(S::LEVELS as u8 - 1)
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.0 == 0
    }

    /// Next level toward the leaf, or `None` at the leaf.
    #[inline]
    pub const fn below(self) -> Option<Self> {
        match self.0 {
            0 => None,
            n => Some(Self(n - 1)),
        }
    }

    /// Bit position of this level's index in a virtual address.
    #[inline]
    pub const fn shift<S: PagingScheme>(self) -> u32 {
        PAGE_SHIFT + S::INDEX_BITS * self.0 as u32
    }

    /// Bytes mapped by a single leaf entry at this level.
    #[inline]
    pub const fn span<S: PagingScheme>(self) -> u64 {
        1 << self.shift::<S>()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Levels of `S` in walk order: root first, leaf last.
pub fn levels_root_first<S: PagingScheme>(
) -> impl ExactSizeIterator<Item = Level> + DoubleEndedIterator {
    (0..S::LEVELS as u8).rev().map(Level)
}

/// Extracts the index of `level` from `va`.
///
/// Total for every address and level; a level above the root yields the
/// (usually zero) bits beyond the scheme's translated range.
#[inline]
pub fn index<S: PagingScheme>(va: VirtAddr<S>, level: Level) -> Index<S> {
    let vpn = va.widen() >> PAGE_SHIFT;
    let bits = vpn.checked_shr(S::INDEX_BITS * level.as_u8() as u32).unwrap_or(0);
    Index::from_raw((bits & S::INDEX_MASK) as usize)
}

/// `(level, index)` pairs for `va`, root first, as a walker consumes them.
pub fn walk_indices<S: PagingScheme>(
    va: VirtAddr<S>,
) -> impl ExactSizeIterator<Item = (Level, Index<S>)> + DoubleEndedIterator {
    levels_root_first::<S>().map(move |level| (level, index(va, level)))
}

/// Packs per-level indices and a page offset into a virtual address.
///
/// `indices[n]` belongs to level `n` (leaf first); missing upper levels are
/// zero. Inputs are range checked only when [`RANGE_CHECKS`] is on, in which
/// case a bad input panics with the [`MmuError`] text.
#[inline]
#[track_caller]
pub fn compose<S: PagingScheme>(indices: &[Index<S>], offset: PageOffset) -> VirtAddr<S> {
    enforce(S::NAME, || check_compose(indices, offset));
    compose_bits(indices, offset)
}

/// Validating form of [`compose`].
pub fn try_compose<S: PagingScheme>(
    indices: &[Index<S>],
    offset: PageOffset,
) -> Result<VirtAddr<S>, MmuError> {
    check_compose(indices, offset)?;
    Ok(compose_bits(indices, offset))
}

/// Converts the packed frame field of `pte` into a physical address.
///
/// Clears the low [`PagingScheme::ENTRY_ADDR_LOW_BITS`] and shifts left by
/// [`PagingScheme::ENTRY_ADDR_SHIFT`], matching the historical layout table
/// bit for bit.
#[inline]
pub fn entry_frame_address<S: PagingScheme>(pte: Pte<S>) -> PhysAddr<S> {
    let low = (1u64 << S::ENTRY_ADDR_LOW_BITS) - 1;
    PhysAddr::from_raw((pte.raw().widen() & !low) << S::ENTRY_ADDR_SHIFT)
}

fn compose_bits<S: PagingScheme>(indices: &[Index<S>], offset: PageOffset) -> VirtAddr<S> {
    let raw = indices.iter().enumerate().fold(offset.widen(), |acc, (level, index)| {
        let shift = Level(level as u8).shift::<S>();
        acc | index.widen().checked_shl(shift).unwrap_or(0)
    });
    VirtAddr::new(S::Word::truncate(raw))
}

fn check_compose<S: PagingScheme>(indices: &[Index<S>], offset: PageOffset) -> Result<(), MmuError> {
    if indices.len() > S::LEVELS {
        log::debug!(target: "mmu", "{}: {} indices for {} levels", S::NAME, indices.len(), S::LEVELS);
        return Err(MmuError::InvalidLevel { level: S::LEVELS as u8, levels: S::LEVELS });
    }
    for index in indices {
        check_range(S::NAME, Field::Index, index.widen(), S::ENTRIES_PER_LEVEL as u64)?;
    }
    check_range(S::NAME, Field::PageOffset, offset.widen(), PAGE_SIZE as u64)
}

pub(crate) fn check_range(
    scheme: &'static str,
    field: Field,
    value: u64,
    limit: u64,
) -> Result<(), MmuError> {
    if value < limit {
        return Ok(());
    }
    log::debug!(target: "mmu", "{}: rejecting {} {:#x} (limit {:#x})", scheme, field, value, limit);
    Err(MmuError::OutOfRange { field, value, limit })
}

/// Runs `check` when range checks are compiled in and panics on failure.
#[inline]
#[track_caller]
pub(crate) fn enforce(scheme: &'static str, check: impl FnOnce() -> Result<(), MmuError>) {
    if RANGE_CHECKS {
        if let Err(err) = check() {
            panic!("{}: {}", scheme, err);
        }
    }
}
