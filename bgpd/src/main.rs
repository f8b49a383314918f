use anyhow::{bail, Result};
use bgp::config::{NeighborConfig, RouterConfig};
use bgp::connection_unix::UnixLink;
use bgp::log::init_logger;
use bgp::router::Router;
use clap::Parser;
use slog::error;
use std::collections::BTreeSet;
use std::sync::mpsc::channel;

mod signal;

#[derive(Parser, Debug)]
#[command(version, about = "Path-vector router", long_about = None)]
struct Cli {
    /// Autonomous system number for this router
    asn: u32,

    /// Neighbor links as <endpoint>-<relation>, with relation one of
    /// cust, peer or prov; order is insignificant
    #[arg(required = true)]
    neighbors: Vec<NeighborConfig>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut seen = BTreeSet::new();
    for n in &cli.neighbors {
        if !seen.insert(n.endpoint) {
            bail!("duplicate neighbor endpoint {}", n.endpoint);
        }
    }

    let log = init_logger();
    let shutdown = signal::arm()?;

    let mut router = Router::new(RouterConfig { asn: cli.asn }, log.clone());
    for n in &cli.neighbors {
        let link = UnixLink::connect(n.endpoint, log.clone())?;
        router.add_neighbor(link, n.relation);
    }

    let (tx, rx) = channel();
    router.spawn_readers(&tx);

    // A hangup on any link or a caught signal is a clean exit. A transport
    // failure on send surfaces here and is logged before exiting.
    if let Err(e) = router.run(rx, shutdown) {
        error!(log, "router loop terminated: {e}");
    }
    Ok(())
}
