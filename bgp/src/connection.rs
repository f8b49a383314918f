use crate::error::Error;
use crate::messages::Envelope;
use std::net::Ipv4Addr;
use std::sync::mpsc::Sender;

/// Index of a link in the router's neighbor table.
pub type LinkId = usize;

/// Events delivered from per-link readers into the router's event channel.
#[derive(Debug)]
pub enum Event {
    /// One framed message arrived on a link.
    Message(LinkId, Envelope),

    /// The far side hung up or the transport failed.
    Hangup(LinkId),
}

/// A point-to-point channel to one neighbor. Implementations deliver
/// exactly one message per frame and preserve per-link arrival order.
pub trait Link: Send {
    /// The neighbor's endpoint address on this link.
    fn endpoint(&self) -> Ipv4Addr;

    /// Send one framed message. Sends are synchronous and assumed to
    /// complete.
    fn send(&self, msg: &Envelope) -> Result<(), Error>;

    /// Start the blocking reader for this link. The reader parses each
    /// frame and delivers it to `tx`, emitting [`Event::Hangup`] when the
    /// transport closes or fails. Malformed frames are dropped by the
    /// reader, not delivered.
    fn spawn_recv(&self, id: LinkId, tx: Sender<Event>);
}
