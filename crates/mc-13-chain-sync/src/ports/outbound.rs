//! Driven port: reaching peers.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Sending side of the transport, as seen by chain sync.
pub trait PeerSender: Send + Sync {
    /// Transport handle of a peer.
    type Peer: Copy + Eq + Hash + Debug + Display + Send + Sync;

    /// Queue one line for `peer`. Returns false if the peer is gone.
    fn send_to(&self, peer: Self::Peer, line: &str) -> bool;

    /// Queue one line for every peer; returns how many accepted it.
    fn broadcast(&self, line: &str) -> usize;
}
