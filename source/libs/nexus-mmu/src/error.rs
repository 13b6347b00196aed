// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors reported by the validating constructors.

use core::fmt;

use thiserror::Error;

/// Quantity that failed a range check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Index into one page-table level.
    Index,
    /// Byte offset within a page.
    PageOffset,
    /// Physical frame number stored in a PTE.
    FrameNumber,
    /// Two-bit software field of a PTE.
    Software,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Index => "index",
            Self::PageOffset => "page offset",
            Self::FrameNumber => "frame number",
            Self::Software => "software field",
        })
    }
}

/// Error returned when a value does not fit the layout of its scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MmuError {
    /// Value lies outside `0..limit` and would spill into a neighbouring field.
    #[error("{field} {value:#x} out of range (limit {limit:#x})")]
    OutOfRange {
        /// Quantity that was rejected.
        field: Field,
        /// Offending value.
        value: u64,
        /// Exclusive upper bound.
        limit: u64,
    },
    /// Level identifier the scheme does not have.
    #[error("level {level} does not exist ({levels} levels)")]
    InvalidLevel {
        /// Offending level.
        level: u8,
        /// Number of levels in the scheme.
        levels: usize,
    },
}
