use crate::error::Error;
use crate::policy::Relation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct RouterConfig {
    /// Autonomous system number of this router.
    pub asn: u32,
}

/// One neighbor link, given on the command line as
/// `<endpoint>-<relation>`, e.g. `10.0.0.2-cust`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct NeighborConfig {
    /// The neighbor's endpoint address, which also names the link socket.
    pub endpoint: Ipv4Addr,
    pub relation: Relation,
}

impl FromStr for NeighborConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (endpoint, relation) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::InvalidNeighborSpec(s.to_string()))?;
        Ok(Self {
            endpoint: endpoint
                .parse()
                .map_err(|_| Error::InvalidNeighborSpec(s.to_string()))?,
            relation: relation.parse()?,
        })
    }
}

impl Display for NeighborConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.endpoint, self.relation)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_neighbor_spec() {
        let n: NeighborConfig = "10.0.0.2-cust".parse().unwrap();
        assert_eq!(n.endpoint, "10.0.0.2".parse::<Ipv4Addr>().unwrap());
        assert_eq!(n.relation, Relation::Cust);
        assert_eq!(n.to_string(), "10.0.0.2-cust");
    }

    #[test]
    fn reject_malformed_specs() {
        assert!("10.0.0.2".parse::<NeighborConfig>().is_err());
        assert!("10.0.0.2-transit".parse::<NeighborConfig>().is_err());
        assert!("not-an-address-cust".parse::<NeighborConfig>().is_err());
    }
}
