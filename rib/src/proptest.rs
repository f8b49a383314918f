// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for prefix arithmetic using proptest.

use crate::types::{
    mask_from_len, mask_len, narrow_mask, prefix_match_len, widen_mask,
    Prefix4,
};
use proptest::prelude::*;
use std::net::Ipv4Addr;

// Strategy for generating valid IPv4 prefixes
fn prefix_strategy() -> impl Strategy<Value = Prefix4> {
    (any::<u32>(), 0u8..=32u8).prop_map(|(addr_bits, length)| {
        Prefix4::new(Ipv4Addr::from(addr_bits), mask_from_len(length))
    })
}

proptest! {
    /// Property: host bits are always unset after construction
    #[test]
    fn prop_host_bits_always_unset(prefix in prefix_strategy()) {
        prop_assert!(
            prefix.host_bits_are_unset(),
            "prefix {prefix} should have host bits unset"
        );
    }

    /// Property: mask length round-trips through mask construction
    #[test]
    fn prop_mask_len_round_trip(length in 0u8..=32u8) {
        prop_assert_eq!(mask_len(mask_from_len(length)), length);
    }

    /// Property: narrowing a widened mask restores it
    #[test]
    fn prop_widen_narrow_round_trip(length in 1u8..=32u8) {
        let mask = mask_from_len(length);
        prop_assert_eq!(narrow_mask(widen_mask(mask)), mask);
    }

    /// Property: every prefix covers its own network address
    #[test]
    fn prop_prefix_covers_own_network(prefix in prefix_strategy()) {
        prop_assert!(prefix.covers(prefix.network));
    }

    /// Property: covering implies a full-length bit match
    #[test]
    fn prop_cover_matches_mask_len(prefix in prefix_strategy(), addr in any::<u32>()) {
        let addr = Ipv4Addr::from(addr);
        let len = prefix.mask_len();
        prop_assert_eq!(
            prefix.covers(addr),
            prefix_match_len(prefix.network, addr, len) == len
        );
    }

    /// Property: adjacency is symmetric and irreflexive
    #[test]
    fn prop_adjacency_symmetric(a in prefix_strategy(), b in prefix_strategy()) {
        prop_assert_eq!(a.is_adjacent(&b), b.is_adjacent(&a));
        prop_assert!(!a.is_adjacent(&a));
    }

    /// Property: the widened form of an adjacent pair covers both halves
    #[test]
    fn prop_widen_covers_both_halves(prefix in prefix_strategy()) {
        prop_assume!(prefix.mask_len() > 0);
        let sibling = Prefix4::new(
            Ipv4Addr::from_bits(
                prefix.network.to_bits() ^ (1u32 << (32 - prefix.mask_len())),
            ),
            prefix.netmask,
        );
        prop_assert!(prefix.is_adjacent(&sibling));

        let merged = prefix.widen();
        prop_assert!(merged.covers(prefix.network));
        prop_assert!(merged.covers(sibling.network));
        prop_assert_eq!(merged, sibling.widen());
    }
}
