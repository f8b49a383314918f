use rib::{PathOrigin, Prefix4};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One message as framed on a link: a single UTF-8 JSON object per
/// sequenced packet, carrying source and destination endpoint addresses and
/// a typed payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Envelope {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    #[serde(flatten)]
    pub payload: Payload,
}

/// The type-dependent body of a message. The serialized form carries the
/// discriminator in `type` and the body in `msg`. A frame whose `type` is
/// not listed here fails to parse and is skipped by the receiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", content = "msg")]
pub enum Payload {
    /// A route announcement.
    #[serde(rename = "update")]
    Update(UpdateAttrs),

    /// Withdrawal of previously announced prefixes, in announcement order.
    #[serde(rename = "revoke")]
    Revoke(Vec<Prefix4>),

    /// A transit packet. The body is opaque and forwarded verbatim.
    #[serde(rename = "data")]
    Data(serde_json::Value),

    /// Request for a copy of the forwarding table.
    #[serde(rename = "dump")]
    Dump(Empty),

    /// Reply to `dump`.
    #[serde(rename = "table")]
    Table(Vec<TableEntry>),

    /// Reply to a data packet that cannot be forwarded, whether for want of
    /// a route or by policy.
    #[serde(rename = "no route")]
    NoRoute(Empty),
}

/// Attributes carried by an update announcement. Field names follow the
/// wire schema.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub struct UpdateAttrs {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub localpref: u32,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: PathOrigin,
}

/// One row of a table reply.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub struct TableEntry {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Ipv4Addr,
}

/// An intentionally empty message body, serialized as `{}`.
#[derive(
    Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, JsonSchema,
)]
pub struct Empty {}
