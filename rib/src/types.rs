// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Number of bits in an IPv4 address.
pub const HOST_MASK: u8 = 32;

/// Count the leading ones of a netmask. Assumes a contiguous mask; for a
/// non-contiguous mask this is the length of the leading run.
pub fn mask_len(mask: Ipv4Addr) -> u8 {
    mask.to_bits().leading_ones() as u8
}

/// The contiguous netmask with `len` leading ones.
pub fn mask_from_len(len: u8) -> Ipv4Addr {
    match len {
        0 => Ipv4Addr::UNSPECIFIED,
        _ => Ipv4Addr::from_bits((!0u32) << (HOST_MASK - len)),
    }
}

/// The mask one bit shorter, i.e. with its lowest set bit cleared.
pub fn widen_mask(mask: Ipv4Addr) -> Ipv4Addr {
    mask_from_len(mask_len(mask).saturating_sub(1))
}

/// The mask one bit longer, i.e. with the bit after its lowest set bit set.
pub fn narrow_mask(mask: Ipv4Addr) -> Ipv4Addr {
    mask_from_len((mask_len(mask) + 1).min(HOST_MASK))
}

/// Number of agreeing high-order bits between two addresses, capped at
/// `limit`. Zero when the first bit already differs.
pub fn prefix_match_len(a: Ipv4Addr, b: Ipv4Addr, limit: u8) -> u8 {
    ((a.to_bits() ^ b.to_bits()).leading_zeros() as u8).min(limit)
}

/// An IPv4 CIDR prefix expressed as the (network, netmask) pair carried on
/// the wire. The netmask is contiguous-ones. Bits of the network outside the
/// mask are zeroed upon construction e.g.
/// ```
/// use rib::types::{mask_from_len, Prefix4};
/// use std::net::Ipv4Addr;
/// let p4 = Prefix4::new(Ipv4Addr::new(10, 0, 0, 10), mask_from_len(24));
/// assert_eq!(p4.network, Ipv4Addr::new(10, 0, 0, 0));
/// ```
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, JsonSchema,
)]
pub struct Prefix4 {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.network != other.network {
            return self.network.cmp(&other.network);
        }
        self.netmask.cmp(&other.netmask)
    }
}

impl Prefix4 {
    pub fn new(network: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        let mut new = Self { network, netmask };
        new.unset_host_bits();
        new
    }

    /// Construct a prefix from wire input, rejecting a non-contiguous
    /// netmask.
    pub fn checked(network: Ipv4Addr, netmask: Ipv4Addr) -> Result<Self, Error> {
        let bits = netmask.to_bits();
        if bits.count_ones() != bits.leading_ones() {
            return Err(Error::NonContiguousMask(netmask));
        }
        Ok(Self::new(network, netmask))
    }

    pub fn mask_len(&self) -> u8 {
        mask_len(self.netmask)
    }

    pub fn host_bits_are_unset(&self) -> bool {
        self.network.to_bits() & self.netmask.to_bits() == self.network.to_bits()
    }

    pub fn unset_host_bits(&mut self) {
        self.network =
            Ipv4Addr::from_bits(self.network.to_bits() & self.netmask.to_bits());
    }

    /// True when the high `mask_len` bits of `addr` agree with the network.
    pub fn covers(&self, addr: Ipv4Addr) -> bool {
        let len = self.mask_len();
        prefix_match_len(self.network, addr, len) == len
    }

    /// Two prefixes of equal mask length whose networks differ only in the
    /// final masked bit form an adjacent pair, expressible as one prefix of
    /// the next-shorter mask.
    pub fn is_adjacent(&self, other: &Prefix4) -> bool {
        if self.netmask != other.netmask {
            return false;
        }
        let len = self.mask_len();
        if len == 0 {
            return false;
        }
        self.network.to_bits() ^ other.network.to_bits()
            == 1u32 << (HOST_MASK - len)
    }

    /// The combined prefix of an adjacent pair: the lower network under the
    /// mask one bit shorter.
    pub fn widen(&self) -> Prefix4 {
        Prefix4::new(self.network, widen_mask(self.netmask))
    }
}

impl Display for Prefix4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.mask_len())
    }
}

impl FromStr for Prefix4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, length) = s
            .split_once('/')
            .ok_or_else(|| Error::MalformedPrefix(s.to_string()))?;
        let network: Ipv4Addr = network
            .parse()
            .map_err(|_| Error::MalformedPrefix(s.to_string()))?;
        let length: u8 = length
            .parse()
            .map_err(|_| Error::MalformedPrefix(s.to_string()))?;
        if length > HOST_MASK {
            return Err(Error::MalformedPrefix(s.to_string()));
        }
        Ok(Self::new(network, mask_from_len(length)))
    }
}

/// Origin class of a route. Selection prefers interior-learned routes over
/// exterior ones, and either over an unknown origin.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum PathOrigin {
    #[serde(rename = "UNK")]
    Unk,
    #[serde(rename = "EGP")]
    Egp,
    #[serde(rename = "IGP")]
    Igp,
}

impl Display for PathOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathOrigin::Unk => "UNK",
            PathOrigin::Egp => "EGP",
            PathOrigin::Igp => "IGP",
        };
        write!(f, "{}", s)
    }
}

/// A route advertised by a neighbor and currently believed valid.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub struct Route {
    pub prefix: Prefix4,

    /// Endpoint address of the neighbor that announced the route.
    pub peer: Ipv4Addr,

    /// Administrative preference. Higher overrides lower in selection.
    pub local_pref: u32,

    /// Set when the route originated at the announcing router.
    pub self_origin: bool,

    /// Autonomous systems traversed by the announcement, in order.
    pub as_path: Vec<u32>,

    pub origin: PathOrigin,
}

impl Route {
    /// Routes whose prefixes are adjacent and whose attributes agree carry
    /// the same forwarding meaning and may be merged into one entry of the
    /// next-shorter mask.
    pub fn coalescible(&self, other: &Route) -> bool {
        self.prefix.is_adjacent(&other.prefix)
            && self.peer == other.peer
            && self.local_pref == other.local_pref
            && self.self_origin == other.self_origin
            && self.origin == other.origin
            && self.as_path == other.as_path
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} [localpref={} path={:?} origin={}{}]",
            self.prefix,
            self.peer,
            self.local_pref,
            self.as_path,
            self.origin,
            if self.self_origin { " self" } else { "" },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mask_arithmetic() {
        let m24 = Ipv4Addr::new(255, 255, 255, 0);
        let m23 = Ipv4Addr::new(255, 255, 254, 0);
        let m25 = Ipv4Addr::new(255, 255, 255, 128);

        assert_eq!(mask_len(m24), 24);
        assert_eq!(mask_len(Ipv4Addr::UNSPECIFIED), 0);
        assert_eq!(mask_len(Ipv4Addr::BROADCAST), 32);

        assert_eq!(mask_from_len(24), m24);
        assert_eq!(widen_mask(m24), m23);
        assert_eq!(narrow_mask(m24), m25);
        assert_eq!(widen_mask(Ipv4Addr::UNSPECIFIED), Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn match_len_zero_on_first_bit_difference() {
        let a = Ipv4Addr::new(128, 0, 0, 0);
        let b = Ipv4Addr::new(0, 0, 0, 0);
        assert_eq!(prefix_match_len(a, b, 32), 0);
        assert_eq!(prefix_match_len(a, a, 16), 16);
    }

    #[test]
    fn covers() {
        let p: Prefix4 = "192.168.4.0/24".parse().unwrap();
        assert!(p.covers(Ipv4Addr::new(192, 168, 4, 5)));
        assert!(!p.covers(Ipv4Addr::new(192, 168, 5, 5)));

        let all: Prefix4 = "0.0.0.0/0".parse().unwrap();
        assert!(all.covers(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn adjacency() {
        let lo: Prefix4 = "192.168.0.0/24".parse().unwrap();
        let hi: Prefix4 = "192.168.1.0/24".parse().unwrap();
        let far: Prefix4 = "192.168.2.0/24".parse().unwrap();

        assert!(lo.is_adjacent(&hi));
        assert!(hi.is_adjacent(&lo));
        assert!(!lo.is_adjacent(&far));
        assert!(!lo.is_adjacent(&lo));

        let merged = hi.widen();
        assert_eq!(merged, "192.168.0.0/23".parse().unwrap());
    }

    #[test]
    fn checked_rejects_discontiguous_mask() {
        let bad = Ipv4Addr::new(255, 0, 255, 0);
        assert!(Prefix4::checked(Ipv4Addr::new(10, 0, 0, 0), bad).is_err());

        let ok = Ipv4Addr::new(255, 255, 0, 0);
        let p = Prefix4::checked(Ipv4Addr::new(10, 0, 77, 1), ok).unwrap();
        assert_eq!(p.network, Ipv4Addr::new(10, 0, 0, 0));
    }

    #[test]
    fn origin_ordering() {
        assert!(PathOrigin::Igp > PathOrigin::Egp);
        assert!(PathOrigin::Egp > PathOrigin::Unk);
    }
}
