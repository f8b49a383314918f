// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The business-relationship policy engine. Each link carries a fixed
//! relationship to the neighbor on its far side, and one rule governs both
//! planes: traffic crosses the router only when a customer is on at least
//! one side of it. The same check applies to re-advertising announcements
//! and to forwarding data packets, so the two planes never disagree about
//! which neighbors may reach one another.

use crate::error::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Business relationship carried by a link.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// The neighbor pays us for transit.
    Cust,
    /// Settlement-free exchange of customer routes.
    Peer,
    /// We pay the neighbor for transit.
    Prov,
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cust" => Ok(Relation::Cust),
            "peer" => Ok(Relation::Peer),
            "prov" => Ok(Relation::Prov),
            _ => Err(Error::InvalidRelation(s.to_string())),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Cust => "cust",
            Relation::Peer => "peer",
            Relation::Prov => "prov",
        };
        write!(f, "{}", s)
    }
}

/// Whether traffic arriving on a link with relation `ingress` may leave on
/// a link with relation `egress`. Peer and provider links may exchange
/// traffic with customers only.
pub fn permitted(ingress: Relation, egress: Relation) -> bool {
    ingress == Relation::Cust || egress == Relation::Cust
}
