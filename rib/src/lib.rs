// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The routing information base (rib).
//!
//! This crate holds everything the router knows about reachability: CIDR
//! prefix arithmetic, route entries and their attributes, the forwarding
//! table with eager aggregation of adjacent equivalent prefixes, the
//! append-only announcement history the table is rebuilt from on
//! revocation, and the bestpath tie-break rules applied over
//! longest-prefix-match candidates.

pub mod bestpath;
pub mod db;
pub mod error;
pub mod types;

pub use db::{Announcement, Rib};
pub use types::{
    mask_from_len, mask_len, narrow_mask, prefix_match_len, widen_mask,
    PathOrigin, Prefix4, Route,
};

#[cfg(test)]
mod proptest;
