// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Address decomposition and PTE bit algebra for RISC-V Sv32/Sv39 paging
//! OWNERS: @kernel-mm-team
//! PUBLIC API: PagingScheme, Sv32, Sv39, VirtAddr, PhysAddr, Index, PageOffset,
//!             FrameNumber, Pte, PteFlags, Flag, Level, MmuError
//! DEPENDS_ON: bitflags (flag vocabulary), thiserror (MmuError), log (rejections)
//! INVARIANTS: Pure arithmetic, no allocation, no I/O; bit layouts match the
//!             hardware PTE formats exactly
//!
//! Page-table walkers, mappers and fault handlers all sit on top of these
//! primitives. Every quantity gets its own value type so an index cannot be
//! passed where an address or frame number is expected, while the compiled
//! arithmetic is the same shift-and-mask a raw integer version would produce.
//!
//! ```
//! use nexus_mmu::{sv32, PageOffset, VirtAddr};
//!
//! let va = VirtAddr::<nexus_mmu::Sv32>::new(0x0040_3000);
//! assert_eq!(sv32::directory_index(va).as_usize(), 1);
//! assert_eq!(sv32::table_index(va).as_usize(), 3);
//! assert_eq!(sv32::page_offset(va), PageOffset::ZERO);
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]

pub mod error;
pub mod flags;
pub mod pte;
pub mod scheme;
pub mod sv32;
pub mod sv39;
pub mod types;
mod word;

pub use error::{Field, MmuError};
pub use flags::{Flag, PteFlags};
pub use pte::Pte;
pub use scheme::{
    compose, entry_frame_address, index, levels_root_first, try_compose, walk_indices, Level,
    PagingScheme, PAGE_SHIFT, PAGE_SIZE, PTE_FLAG_BITS, PTE_PPN_SHIFT, RANGE_CHECKS,
};
pub use sv32::Sv32;
pub use sv39::Sv39;
pub use types::{FrameNumber, Index, PageOffset, PhysAddr, VirtAddr};
pub use word::Word;


#[cfg(test)]
mod tests_prop;
