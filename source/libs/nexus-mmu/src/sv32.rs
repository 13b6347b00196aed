// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sv32: two-level paging over a 32-bit virtual address space.
//!
//! ```text
//! +--------10------+-------10-------+---------12----------+
//! | Page Directory |   Page Table   | Offset within Page  |
//! |      Index     |     Index      |                     |
//! +----------------+----------------+---------------------+
//! ```
//!
//! Entries are 32 bits; the 22-bit PPN reaches a 34-bit physical space.

use static_assertions::const_assert_eq;

use crate::error::MmuError;
use crate::pte::Pte;
use crate::scheme::{self, Level, PagingScheme, PAGE_SHIFT, PAGE_SIZE};
use crate::types::{FrameNumber, Index, PageOffset, PhysAddr, VirtAddr};

/// Marker for the Sv32 layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sv32;

impl PagingScheme for Sv32 {
    type Word = u32;

    const NAME: &'static str = "Sv32";
    const LEVELS: usize = 2;
    const INDEX_BITS: u32 = 10;
    const VA_BITS: u32 = 32;
    const PPN_BITS: u32 = 22;
    const ENTRY_ADDR_LOW_BITS: u32 = 10;
    const ENTRY_ADDR_SHIFT: u32 = 2;
}

/// Level of the page directory.
pub const DIRECTORY: Level = Level::L1;
/// Level of the page tables.
pub const TABLE: Level = Level::L0;

/// Page-directory entries per directory.
pub const ENTRIES_PER_DIRECTORY: usize = Sv32::ENTRIES_PER_LEVEL;
/// Page-table entries per table.
pub const ENTRIES_PER_TABLE: usize = Sv32::ENTRIES_PER_LEVEL;
/// Bit position of the table index.
pub const TABLE_SHIFT: u32 = TABLE.shift::<Sv32>();
/// Bit position of the directory index.
pub const DIRECTORY_SHIFT: u32 = DIRECTORY.shift::<Sv32>();
/// Bytes mapped by one directory entry (a 4 MiB superpage).
pub const SUPERPAGE_SIZE: u64 = DIRECTORY.span::<Sv32>();
/// log2 of [`SUPERPAGE_SIZE`].
pub const SUPERPAGE_SHIFT: u32 = DIRECTORY_SHIFT;

const_assert_eq!(ENTRIES_PER_DIRECTORY, 1024);
const_assert_eq!(PAGE_SIZE, 4096);
const_assert_eq!(TABLE_SHIFT, PAGE_SHIFT);
const_assert_eq!(DIRECTORY_SHIFT, 22);
const_assert_eq!(SUPERPAGE_SIZE, PAGE_SIZE as u64 * ENTRIES_PER_TABLE as u64);
const_assert_eq!(Sv32::TABLE_SIZE, PAGE_SIZE);

/// Bits [31:22] of `va`.
#[inline]
pub fn directory_index(va: VirtAddr<Sv32>) -> Index<Sv32> {
    scheme::index(va, DIRECTORY)
}

/// Bits [21:12] of `va`.
#[inline]
pub fn table_index(va: VirtAddr<Sv32>) -> Index<Sv32> {
    scheme::index(va, TABLE)
}

/// Bits [11:0] of `va`.
#[inline]
pub fn page_offset(va: VirtAddr<Sv32>) -> PageOffset {
    va.page_offset()
}

/// `va >> 12`: directory and table index as one number.
#[inline]
pub fn page_frame_number(va: VirtAddr<Sv32>) -> FrameNumber<Sv32> {
    va.page_number()
}

/// `(dir << 22) | (table << 12) | offset`.
#[inline]
#[track_caller]
pub fn compose_address(
    dir: Index<Sv32>,
    table: Index<Sv32>,
    offset: PageOffset,
) -> VirtAddr<Sv32> {
    scheme::compose(&[table, dir], offset)
}

pub fn try_compose_address(
    dir: Index<Sv32>,
    table: Index<Sv32>,
    offset: PageOffset,
) -> Result<VirtAddr<Sv32>, MmuError> {
    scheme::try_compose(&[table, dir], offset)
}

/// `(pte & !0x3ff) << 2`: physical address of the frame a directory or
/// table entry points at.
#[inline]
pub fn entry_frame_address(pte: Pte<Sv32>) -> PhysAddr<Sv32> {
    scheme::entry_frame_address(pte)
}
