use mc_05_wire_protocol::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Peer {peer} is no longer reachable")]
    PeerGone { peer: String },
}
