// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::connection::{Event, Link, LinkId};
use crate::error::Error;
use crate::messages::Envelope;
use slog::{debug, info, trace, warn, Logger};
use socket2::{Domain, SockAddr, Socket, Type};
use std::mem::MaybeUninit;
use std::net::Ipv4Addr;
use std::sync::mpsc::Sender;
use std::thread::spawn;

/// Largest frame accepted from a link.
const MAX_FRAME: usize = 0x10000;

/// A link over a local sequenced-packet socket. The socket is named in the
/// filesystem by the neighbor's endpoint address and carries one JSON
/// message per packet.
pub struct UnixLink {
    endpoint: Ipv4Addr,
    sock: Socket,
    log: Logger,
}

impl UnixLink {
    /// Connect to the sequenced-packet socket named by `endpoint`.
    pub fn connect(endpoint: Ipv4Addr, log: Logger) -> Result<Self, Error> {
        let sock = Socket::new(Domain::UNIX, Type::SEQPACKET, None)?;
        sock.connect(&SockAddr::unix(endpoint.to_string())?)?;
        info!(log, "connected to {}", endpoint);
        Ok(Self {
            endpoint,
            sock,
            log,
        })
    }
}

impl Link for UnixLink {
    fn endpoint(&self) -> Ipv4Addr {
        self.endpoint
    }

    fn send(&self, msg: &Envelope) -> Result<(), Error> {
        let buf = serde_json::to_vec(msg)?;
        self.sock.send(&buf)?;
        Ok(())
    }

    fn spawn_recv(&self, id: LinkId, tx: Sender<Event>) {
        let sock = match self.sock.try_clone() {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    self.log,
                    "[{}] cloning socket for reader failed: {e}", self.endpoint
                );
                let _ = tx.send(Event::Hangup(id));
                return;
            }
        };
        let endpoint = self.endpoint;
        let log = self.log.clone();

        info!(log, "[{endpoint}] spawning recv loop");
        spawn(move || {
            let mut buf = [MaybeUninit::<u8>::uninit(); MAX_FRAME];
            loop {
                match sock.recv(&mut buf) {
                    Ok(0) => {
                        info!(log, "[{endpoint}] peer hung up");
                        let _ = tx.send(Event::Hangup(id));
                        break;
                    }
                    Ok(n) => {
                        // recv initialized the first n bytes of the buffer.
                        let frame = unsafe {
                            std::slice::from_raw_parts(
                                buf.as_ptr() as *const u8,
                                n,
                            )
                        };
                        match serde_json::from_slice::<Envelope>(frame) {
                            Ok(msg) => {
                                trace!(log, "[{endpoint}] recv: {msg:?}");
                                if tx.send(Event::Message(id, msg)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(
                                    log,
                                    "[{endpoint}] dropping malformed frame: {e}"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        warn!(log, "[{endpoint}] read failed: {e}");
                        let _ = tx.send(Event::Hangup(id));
                        break;
                    }
                }
            }
        });
    }
}
