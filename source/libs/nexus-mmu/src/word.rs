// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Machine words a paging scheme stores addresses and entries in.

use core::fmt;
use core::hash::Hash;

mod private {
    pub trait Sealed {}
}

/// Unsigned integer backing a scheme's virtual addresses and PTEs.
///
/// Arithmetic is done in `u64` and narrowed on the way out, so `truncate`
/// drops exactly the bits a native-width shift would have lost.
pub trait Word:
    Copy
    + Default
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::LowerHex
    + fmt::UpperHex
    + private::Sealed
    + 'static
{
    /// Width of the word in bits.
    const BITS: u32;

    /// Zero-extends the word to 64 bits.
    fn widen(self) -> u64;

    /// Keeps the low `BITS` bits of `raw`.
    fn truncate(raw: u64) -> Self;
}

macro_rules! impl_word {
    ($($ty:ty),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Word for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                fn widen(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn truncate(raw: u64) -> Self {
                    raw as $ty
                }
            }
        )*
    };
}

impl_word!(u32, u64);
