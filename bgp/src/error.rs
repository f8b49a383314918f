#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("channel send {0}")]
    ChannelSend(String),

    #[error("invalid neighbor spec {0}")]
    InvalidNeighborSpec(String),

    #[error("invalid relation {0}")]
    InvalidRelation(String),

    #[error("unknown peer {0}")]
    UnknownPeer(std::net::Ipv4Addr),

    #[error("prefix error {0}")]
    Prefix(#[from] rib::error::Error),
}
