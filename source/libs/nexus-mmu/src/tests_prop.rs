// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for Sv32/Sv39 decomposition and PTE packing
//! OWNERS: @kernel-mm-team
//! NOTE: Tests only; no translation logic.
//!
//! TEST_SCOPE:
//!   - Decompose/compose round trip over the full translated range
//!   - Extracted indices stay inside one table
//!   - Generic and named Sv39 extractors agree
//!   - PTE frame field survives packing and re-alignment
//!
//! TEST_SCENARIOS:
//!   - sv32_round_trip(): every u32 address recomposes to itself
//!   - sv39_round_trip(): every 39-bit address recomposes to itself
//!   - indices_in_range(): directory/table < 1024, vpn0..2 < 512
//!   - sv39_extractor_equivalence(): vpn(va, n) == vpnN(va)
//!   - sv32_realignment() / sv39_realignment(): entry_frame_address(with_frame(F))
//!   - flags_survive_packing(): any flag word decodes back unchanged

use proptest::prelude::*;

use crate::{
    sv32, sv39, walk_indices, FrameNumber, PhysAddr, PteFlags, Sv32, Sv39, VirtAddr,
    PTE_FLAG_BITS,
};

fn arb_flags() -> impl Strategy<Value = PteFlags> {
    (0u16..(1 << PTE_FLAG_BITS)).prop_map(PteFlags::from_bits_truncate)
}

proptest! {
    #[test]
    fn sv32_round_trip(raw in any::<u32>()) {
        let va = VirtAddr::<Sv32>::new(raw);
        let back = sv32::compose_address(sv32::directory_index(va), sv32::table_index(va), sv32::page_offset(va));
        prop_assert_eq!(back, va);
        prop_assert_eq!(sv32::page_frame_number(va).raw(), u64::from(raw >> 12));
    }

    #[test]
    fn sv39_round_trip(raw in 0u64..(1 << 39)) {
        let va = VirtAddr::<Sv39>::new(raw);
        let back = sv39::compose_address(sv39::vpn2(va), sv39::vpn1(va), sv39::vpn0(va), sv39::page_offset(va));
        prop_assert_eq!(back, va);
    }

    #[test]
    fn indices_in_range(raw32 in any::<u32>(), raw39 in any::<u64>()) {
        let va = VirtAddr::<Sv32>::new(raw32);
        prop_assert!(sv32::directory_index(va).as_usize() < 1024);
        prop_assert!(sv32::table_index(va).as_usize() < 1024);
        prop_assert!(sv32::page_offset(va).as_usize() < 4096);

        let va = VirtAddr::<Sv39>::new(raw39);
        for (_, index) in walk_indices(va) {
            prop_assert!(index.as_usize() < 512);
        }
        prop_assert!(sv39::page_offset(va).as_usize() < 4096);
    }

    #[test]
    fn sv39_extractor_equivalence(raw in any::<u64>()) {
        let va = VirtAddr::<Sv39>::new(raw);
        prop_assert_eq!(sv39::vpn(va, sv39::PT0), sv39::vpn0(va));
        prop_assert_eq!(sv39::vpn(va, sv39::PT1), sv39::vpn1(va));
        prop_assert_eq!(sv39::vpn(va, sv39::PT2), sv39::vpn2(va));
        prop_assert_eq!(sv39::vpn2(va).widen(), (raw >> 30) & 0x1ff);
    }

    #[test]
    fn sv32_realignment(frame in 0u64..(1 << 22), flags in arb_flags()) {
        let pte = flags.with_frame(FrameNumber::<Sv32>::from_raw(frame));
        prop_assert_eq!(sv32::entry_frame_address(pte), PhysAddr::from_raw(frame << 12));
        prop_assert_eq!(pte.frame_number().raw(), frame);
    }

    #[test]
    fn sv39_realignment(frame in 0u64..(1 << 44)) {
        let pte = PteFlags::READ_WRITE.with_frame(FrameNumber::<Sv39>::from_raw(frame));
        prop_assert_eq!(sv39::entry_frame_address(pte), PhysAddr::from_raw(frame << 13));
        prop_assert_eq!(pte.frame_address(), PhysAddr::from_raw(frame << 12));
    }

    #[test]
    fn flags_survive_packing(frame in 0u64..(1 << 22), flags in arb_flags()) {
        let a = flags.with_frame(FrameNumber::<Sv32>::from_raw(frame));
        let b = flags.with_frame(FrameNumber::<Sv39>::from_raw(frame));
        prop_assert_eq!(a.flags(), flags);
        prop_assert_eq!(b.flags(), flags);
        prop_assert_eq!(a.is_leaf(), flags.is_leaf());
    }
}
