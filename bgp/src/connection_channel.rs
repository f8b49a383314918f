// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! This file contains code for testing purposes only. Note that it's only
//! included in `lib.rs` with a `#[cfg(test)]` guard. It implements [`Link`]
//! over in-process channels so the routing core in `router.rs` can be
//! exercised against a simulated set of neighbors.

use crate::connection::{Event, Link, LinkId};
use crate::error::Error;
use crate::messages::Envelope;
use std::net::Ipv4Addr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::spawn;

/// A link whose far side is an in-process endpoint held by the test
/// harness.
pub struct ChannelLink {
    endpoint: Ipv4Addr,
    tx: Sender<Envelope>,
    rx: Mutex<Option<Receiver<Envelope>>>,
}

/// Create a link to `peer` plus the harness-side endpoint used to inject
/// inbound messages and observe outbound ones.
pub fn link(peer: Ipv4Addr) -> (ChannelLink, Endpoint<Envelope>) {
    let (local, remote) = channel();
    (
        ChannelLink {
            endpoint: peer,
            tx: local.tx,
            rx: Mutex::new(Some(local.rx)),
        },
        remote,
    )
}

impl Link for ChannelLink {
    fn endpoint(&self) -> Ipv4Addr {
        self.endpoint
    }

    fn send(&self, msg: &Envelope) -> Result<(), Error> {
        self.tx
            .send(msg.clone())
            .map_err(|e| Error::ChannelSend(e.to_string()))
    }

    fn spawn_recv(&self, id: LinkId, tx: Sender<Event>) {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("reader already started");
        spawn(move || loop {
            match rx.recv() {
                Ok(msg) => {
                    if tx.send(Event::Message(id, msg)).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    let _ = tx.send(Event::Hangup(id));
                    break;
                }
            }
        });
    }
}

// BIDI

/// A combined (duplex) mpsc sender/receiver.
pub struct Endpoint<T> {
    pub rx: Receiver<T>,
    pub tx: Sender<T>,
}

impl<T> Endpoint<T> {
    fn new(rx: Receiver<T>, tx: Sender<T>) -> Self {
        Self { rx, tx }
    }
}

/// Analogous to std::sync::mpsc::channel for bidirectional endpoints.
pub fn channel<T>() -> (Endpoint<T>, Endpoint<T>) {
    let (tx_a, rx_b) = mpsc::channel();
    let (tx_b, rx_a) = mpsc::channel();
    (Endpoint::new(rx_a, tx_a), Endpoint::new(rx_b, tx_b))
}
