use std::io;
use thiserror::Error;

use super::PeerId;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Peer table full ({capacity} peers)")]
    TableFull { capacity: usize },

    #[error("Unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("Peer {0} disconnected")]
    Disconnected(PeerId),
}

pub type TransportResult<T> = Result<T, TransportError>;
