//! Driven ports: what consensus needs from the rest of the node.

/// Fan-out to connected peers.
pub trait PeerBroadcast: Send + Sync {
    /// Send one protocol line to every peer; returns how many accepted it.
    fn broadcast(&self, line: &str) -> usize;

    /// Live number of connected peers. Must not be cached.
    fn peer_count(&self) -> usize;
}

/// Whether chain sync is currently backfilling.
pub trait SyncStatus: Send + Sync {
    fn is_syncing(&self) -> bool;
}
