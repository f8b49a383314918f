use crate::config::RouterConfig;
use crate::connection::{Event, Link, LinkId};
use crate::error::Error;
use crate::messages::{Empty, Envelope, Payload, TableEntry, UpdateAttrs};
use crate::policy::{self, Relation};
use rib::{Prefix4, Rib, Route};
use slog::{debug, info, trace, Logger};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// How long the event loop waits for a message before rechecking the
/// shutdown flag. Bounds shutdown latency only; no protocol timer depends
/// on it.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The router's own address on a link. A neighbor endpoint is named
/// `x.y.z.2` and the router is addressed as `x.y.z.1` on the same link;
/// every locally originated message derives its source address here. This
/// is a convention of the link naming scheme, not of the protocol.
pub fn local_endpoint(peer: Ipv4Addr) -> Ipv4Addr {
    let octets = peer.octets();
    Ipv4Addr::new(octets[0], octets[1], octets[2], 1)
}

/// One configured neighbor: the link to it and the business relationship
/// the link carries.
pub struct Neighbor<Cnx: Link> {
    pub link: Cnx,
    pub relation: Relation,
}

/// The routing engine. Owns the rib and the neighbor table and dispatches
/// every inbound message. All mutation happens on the thread driving
/// [`Router::run`] (or [`Router::on_message`] directly), so the rib needs
/// no interior locking.
pub struct Router<Cnx: Link> {
    pub config: RouterConfig,
    neighbors: Vec<Neighbor<Cnx>>,
    rib: Rib,
    log: Logger,
}

impl<Cnx: Link> Router<Cnx> {
    pub fn new(config: RouterConfig, log: Logger) -> Self {
        Self {
            config,
            neighbors: Vec::new(),
            rib: Rib::new(log.clone()),
            log,
        }
    }

    pub fn add_neighbor(&mut self, link: Cnx, relation: Relation) {
        debug!(self.log, "adding neighbor {} ({})", link.endpoint(), relation);
        self.neighbors.push(Neighbor { link, relation });
    }

    pub fn rib(&self) -> &Rib {
        &self.rib
    }

    /// Start one reader per neighbor link, all feeding `tx`.
    pub fn spawn_readers(&self, tx: &Sender<Event>) {
        for (id, neighbor) in self.neighbors.iter().enumerate() {
            neighbor.link.spawn_recv(id, tx.clone());
        }
    }

    /// Consume link events until a hangup, a send failure, or the shutdown
    /// flag. Each message is fully processed before the next is read.
    pub fn run(
        &mut self,
        rx: Receiver<Event>,
        shutdown: &AtomicBool,
    ) -> Result<(), Error> {
        info!(
            self.log,
            "router up";
            "asn" => self.config.asn,
            "links" => self.neighbors.len()
        );
        loop {
            if shutdown.load(Ordering::Acquire) {
                info!(self.log, "caught shutdown flag, terminating");
                return Ok(());
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Event::Message(id, msg)) => self.on_message(id, msg)?,
                Ok(Event::Hangup(id)) => {
                    info!(
                        self.log,
                        "link {} closed, terminating",
                        self.neighbors[id].link.endpoint()
                    );
                    return Ok(());
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    /// Dispatch one inbound message by type.
    pub fn on_message(
        &mut self,
        ingress: LinkId,
        env: Envelope,
    ) -> Result<(), Error> {
        trace!(self.log, "rx[{ingress}]: {env:?}");
        let Envelope { src, dst, payload } = env;
        match payload {
            Payload::Update(attrs) => self.handle_update(ingress, attrs),
            Payload::Revoke(prefixes) => self.handle_revoke(ingress, prefixes),
            payload @ Payload::Data(_) => {
                self.handle_data(ingress, Envelope { src, dst, payload })
            }
            Payload::Dump(_) => self.handle_dump(ingress, src, dst),
            Payload::Table(_) | Payload::NoRoute(_) => {
                debug!(self.log, "ignoring reply-type message on link {ingress}");
                Ok(())
            }
        }
    }

    fn handle_update(
        &mut self,
        ingress: LinkId,
        attrs: UpdateAttrs,
    ) -> Result<(), Error> {
        let prefix = match Prefix4::checked(attrs.network, attrs.netmask) {
            Ok(p) => p,
            Err(e) => {
                debug!(self.log, "dropping malformed update: {e}");
                return Ok(());
            }
        };
        let peer = self.neighbors[ingress].link.endpoint();
        self.rib.update(Route {
            prefix,
            peer,
            local_pref: attrs.localpref,
            self_origin: attrs.self_origin,
            as_path: attrs.as_path.clone(),
            origin: attrs.origin,
        });

        // Re-advertise a copy, never the received attributes: the history
        // retains announcements exactly as received. Our ASN joins the path
        // once at most.
        let mut fwd = attrs;
        if !fwd.as_path.contains(&self.config.asn) {
            fwd.as_path.push(self.config.asn);
        }
        self.propagate(ingress, Payload::Update(fwd))
    }

    fn handle_revoke(
        &mut self,
        ingress: LinkId,
        prefixes: Vec<Prefix4>,
    ) -> Result<(), Error> {
        let mut checked = Vec::with_capacity(prefixes.len());
        for p in &prefixes {
            match Prefix4::checked(p.network, p.netmask) {
                Ok(p) => checked.push(p),
                Err(e) => {
                    debug!(self.log, "dropping malformed revoke: {e}");
                    return Ok(());
                }
            }
        }
        let peer = self.neighbors[ingress].link.endpoint();
        self.rib.revoke(peer, checked);

        // The body is forwarded unchanged; a revoke carries no AS path to
        // extend.
        self.propagate(ingress, Payload::Revoke(prefixes))
    }

    fn handle_data(&self, ingress: LinkId, env: Envelope) -> Result<(), Error> {
        let from = self.neighbors[ingress].relation;
        if let Some(route) = self.rib.best_route(env.dst) {
            let egress = self.neighbor_for(route.peer)?;
            if policy::permitted(from, egress.relation) {
                trace!(
                    self.log,
                    "forwarding data for {} via {}",
                    env.dst,
                    route.peer
                );
                return egress.link.send(&env);
            }
            debug!(
                self.log,
                "policy denies data from {} link toward {} link",
                from,
                egress.relation
            );
        } else {
            debug!(self.log, "no route for {}", env.dst);
        }

        let ingress_peer = self.neighbors[ingress].link.endpoint();
        let reply = Envelope {
            src: local_endpoint(ingress_peer),
            dst: env.src,
            payload: Payload::NoRoute(Empty {}),
        };
        self.neighbors[ingress].link.send(&reply)
    }

    fn handle_dump(
        &self,
        ingress: LinkId,
        src: Ipv4Addr,
        dst: Ipv4Addr,
    ) -> Result<(), Error> {
        let table = self
            .rib
            .routes()
            .iter()
            .map(|r| TableEntry {
                network: r.prefix.network,
                netmask: r.prefix.netmask,
                peer: r.peer,
            })
            .collect();
        let reply = Envelope {
            src: dst,
            dst: src,
            payload: Payload::Table(table),
        };
        self.neighbors[ingress].link.send(&reply)
    }

    /// Send `payload` to every link other than `ingress` that policy
    /// permits, with source and destination addresses rewritten for each
    /// egress link.
    fn propagate(&self, ingress: LinkId, payload: Payload) -> Result<(), Error> {
        let from = self.neighbors[ingress].relation;
        for (id, neighbor) in self.neighbors.iter().enumerate() {
            if id == ingress || !policy::permitted(from, neighbor.relation) {
                continue;
            }
            let peer = neighbor.link.endpoint();
            trace!(self.log, "re-advertising to {}", peer);
            neighbor.link.send(&Envelope {
                src: local_endpoint(peer),
                dst: peer,
                payload: payload.clone(),
            })?;
        }
        Ok(())
    }

    fn neighbor_for(&self, peer: Ipv4Addr) -> Result<&Neighbor<Cnx>, Error> {
        self.neighbors
            .iter()
            .find(|n| n.link.endpoint() == peer)
            .ok_or(Error::UnknownPeer(peer))
    }
}
