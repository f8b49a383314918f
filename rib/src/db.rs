// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The routing information base (rib).
//!
//! The rib holds the forwarding table built from neighbor announcements,
//! together with the announcement history the table can be rebuilt from.
//! Adjacent equivalent prefixes are coalesced eagerly on insertion. Because
//! coalescing is lossy, a revocation rebuilds the table by replaying the
//! surviving history rather than attempting to split aggregates in place.

use crate::bestpath;
use crate::types::{Prefix4, Route};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slog::{debug, trace, Logger};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// One received announcement, retained verbatim and in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub enum Announcement {
    Update(Route),
    Revoke {
        peer: Ipv4Addr,
        prefixes: Vec<Prefix4>,
    },
}

/// The forwarding table and the history it is derived from.
pub struct Rib {
    /// Active routes. Kept free of coalescible pairs at all times.
    routes: Vec<Route>,

    /// Every update and revoke ever received, in arrival order. This is the
    /// ground truth the table is rebuilt from.
    history: Vec<Announcement>,

    /// (peer, prefix) pairs named by revoke announcements. An entry here
    /// nullifies every matching historical update during a rebuild.
    revoked: BTreeSet<(Ipv4Addr, Prefix4)>,

    log: Logger,
}

impl Rib {
    pub fn new(log: Logger) -> Self {
        Self {
            routes: Vec::new(),
            history: Vec::new(),
            revoked: BTreeSet::new(),
            log,
        }
    }

    /// Apply an update announcement: record it and insert the route through
    /// the coalescing insertion protocol.
    pub fn update(&mut self, route: Route) {
        debug!(self.log, "update: {}", route);
        self.history.push(Announcement::Update(route.clone()));
        self.insert(route);
    }

    /// Apply a revoke announcement for the given prefixes: record it, extend
    /// the revocation set, and rebuild the table from history.
    pub fn revoke(&mut self, peer: Ipv4Addr, prefixes: Vec<Prefix4>) {
        debug!(self.log, "revoke from {}: {} prefixes", peer, prefixes.len());
        self.history.push(Announcement::Revoke {
            peer,
            prefixes: prefixes.clone(),
        });
        for prefix in prefixes {
            self.revoked.insert((peer, prefix));
        }
        self.rebuild();
    }

    /// The best route toward `dst`: longest-prefix match first, then the
    /// tie-break rules over the equally-specific candidates.
    pub fn best_route(&self, dst: Ipv4Addr) -> Option<&Route> {
        let longest = self
            .routes
            .iter()
            .filter(|r| r.prefix.covers(dst))
            .map(|r| r.prefix.mask_len())
            .max()?;
        let candidates = self
            .routes
            .iter()
            .filter(|r| r.prefix.covers(dst) && r.prefix.mask_len() == longest)
            .collect();
        bestpath::select(candidates)
    }

    /// Snapshot of the active table.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn history(&self) -> &[Announcement] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Insert a route, replacing any previous announcement of the same
    /// prefix by the same peer, then coalesce transitively: a single
    /// insertion may cascade into higher-order aggregates. Each merge
    /// shortens a mask, so the cascade terminates.
    fn insert(&mut self, route: Route) {
        self.routes
            .retain(|r| !(r.prefix == route.prefix && r.peer == route.peer));
        self.routes.push(route);

        let mut i = self.routes.len() - 1;
        loop {
            let partner = (0..self.routes.len())
                .find(|&j| j != i && self.routes[j].coalescible(&self.routes[i]));
            match partner {
                Some(j) => {
                    let merged = self.routes[i].prefix.widen();
                    trace!(
                        self.log,
                        "coalesce {} + {} -> {}",
                        self.routes[i].prefix,
                        self.routes[j].prefix,
                        merged
                    );
                    self.routes[i].prefix = merged;
                    self.routes.remove(j);
                    if j < i {
                        i -= 1;
                    }
                }
                None => break,
            }
        }
    }

    /// Clear the table and replay every historical update not nullified by
    /// the revocation set, in arrival order, through the normal insertion
    /// protocol so coalescing reforms where still valid.
    fn rebuild(&mut self) {
        self.routes.clear();
        let replay: Vec<Route> = self
            .history
            .iter()
            .filter_map(|a| match a {
                Announcement::Update(r)
                    if !self.revoked.contains(&(r.peer, r.prefix)) =>
                {
                    Some(r.clone())
                }
                _ => None,
            })
            .collect();
        let replayed = replay.len();
        for route in replay {
            self.insert(route);
        }
        debug!(
            self.log,
            "table rebuilt";
            "replayed" => replayed,
            "routes" => self.routes.len()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::PathOrigin;
    use slog::Drain;

    fn test_logger() -> Logger {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_envlogger::new(drain).fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog::o!())
    }

    fn route(prefix: &str, peer: &str) -> Route {
        Route {
            prefix: prefix.parse().unwrap(),
            peer: peer.parse().unwrap(),
            local_pref: 100,
            self_origin: false,
            as_path: vec![7],
            origin: PathOrigin::Egp,
        }
    }

    #[test]
    fn reannouncement_replaces() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("10.1.0.0/16", "10.0.0.2"));

        let mut newer = route("10.1.0.0/16", "10.0.0.2");
        newer.local_pref = 200;
        rib.update(newer);

        assert_eq!(rib.len(), 1);
        assert_eq!(rib.routes()[0].local_pref, 200);
    }

    #[test]
    fn identical_updates_are_idempotent() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("10.1.0.0/16", "10.0.0.2"));
        let before = rib.routes().to_vec();
        rib.update(route("10.1.0.0/16", "10.0.0.2"));
        assert_eq!(rib.routes(), &before[..]);
    }

    #[test]
    fn adjacent_equivalents_coalesce() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("192.168.0.0/24", "10.0.0.2"));
        rib.update(route("192.168.1.0/24", "10.0.0.2"));

        assert_eq!(rib.len(), 1);
        assert_eq!(rib.routes()[0].prefix, "192.168.0.0/23".parse().unwrap());
    }

    #[test]
    fn coalescing_cascades() {
        let mut rib = Rib::new(test_logger());
        for net in ["192.168.0.0", "192.168.1.0", "192.168.2.0", "192.168.3.0"]
        {
            rib.update(route(&format!("{net}/24"), "10.0.0.2"));
        }

        assert_eq!(rib.len(), 1);
        assert_eq!(rib.routes()[0].prefix, "192.168.0.0/22".parse().unwrap());
    }

    #[test]
    fn differing_attributes_do_not_coalesce() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("192.168.0.0/24", "10.0.0.2"));
        let mut other = route("192.168.1.0/24", "10.0.0.2");
        other.as_path = vec![7, 8];
        rib.update(other);

        assert_eq!(rib.len(), 2);
    }

    #[test]
    fn aggregation_preserves_matched_addresses() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("192.168.0.0/24", "10.0.0.2"));
        rib.update(route("192.168.1.0/24", "10.0.0.2"));

        assert!(rib.best_route("192.168.0.77".parse().unwrap()).is_some());
        assert!(rib.best_route("192.168.1.77".parse().unwrap()).is_some());
        assert!(rib.best_route("192.168.2.77".parse().unwrap()).is_none());
    }

    #[test]
    fn longest_prefix_wins() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("192.168.0.0/16", "10.0.0.2"));
        rib.update(route("192.168.4.0/24", "10.0.1.2"));

        let best = rib.best_route("192.168.4.5".parse().unwrap()).unwrap();
        assert_eq!(best.peer, "10.0.1.2".parse::<Ipv4Addr>().unwrap());

        let best = rib.best_route("192.168.9.9".parse().unwrap()).unwrap();
        assert_eq!(best.peer, "10.0.0.2".parse::<Ipv4Addr>().unwrap());
    }

    #[test]
    fn revoke_splits_aggregate() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("192.168.0.0/24", "10.0.0.2"));
        rib.update(route("192.168.1.0/24", "10.0.0.2"));
        assert_eq!(rib.len(), 1);

        rib.revoke(
            "10.0.0.2".parse().unwrap(),
            vec!["192.168.1.0/24".parse().unwrap()],
        );

        assert_eq!(rib.len(), 1);
        assert_eq!(rib.routes()[0].prefix, "192.168.0.0/24".parse().unwrap());
        assert!(rib.best_route("192.168.1.5".parse().unwrap()).is_none());
    }

    #[test]
    fn revoke_inverts_update() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("10.1.0.0/16", "10.0.0.2"));
        rib.revoke(
            "10.0.0.2".parse().unwrap(),
            vec!["10.1.0.0/16".parse().unwrap()],
        );
        assert!(rib.is_empty());
    }

    #[test]
    fn revoke_only_matches_announcing_peer() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("10.1.0.0/16", "10.0.0.2"));
        rib.update(route("10.1.0.0/16", "10.0.1.2"));

        rib.revoke(
            "10.0.0.2".parse().unwrap(),
            vec!["10.1.0.0/16".parse().unwrap()],
        );

        assert_eq!(rib.len(), 1);
        assert_eq!(
            rib.routes()[0].peer,
            "10.0.1.2".parse::<Ipv4Addr>().unwrap()
        );
    }

    #[test]
    fn rebuild_replays_history_in_order() {
        let mut rib = Rib::new(test_logger());
        rib.update(route("10.1.0.0/16", "10.0.0.2"));
        let mut newer = route("10.1.0.0/16", "10.0.0.2");
        newer.local_pref = 200;
        rib.update(newer);
        rib.update(route("172.16.0.0/16", "10.0.1.2"));

        // An unrelated revoke forces a full rebuild. The replacement
        // semantics of replayed re-announcements must survive it.
        rib.revoke(
            "10.0.1.2".parse().unwrap(),
            vec!["172.16.0.0/16".parse().unwrap()],
        );

        assert_eq!(rib.len(), 1);
        assert_eq!(rib.routes()[0].local_pref, 200);
    }
}
