//! Inbound port: what the rest of the node may ask of the transport.

use crate::domain::{PeerId, PeerInfo, TransportResult};

/// Sending side of the transport.
///
/// Lines are passed without their terminator; the transport appends `\n`.
pub trait PeerTransport: Send + Sync {
    /// Queue `line` for every connected peer. Returns how many peers accepted it.
    fn broadcast(&self, line: &str) -> usize;

    /// Queue `line` for one peer.
    fn send_to(&self, peer: PeerId, line: &str) -> TransportResult<()>;

    /// Number of connected peers.
    fn peer_count(&self) -> usize;

    /// Snapshot of the peer table in connection order.
    fn peers(&self) -> Vec<PeerInfo>;
}
