//! # Peer Port Adapters
//!
//! Implements the peer-facing outbound ports of mc-08 and mc-13 on top of the
//! mc-01 registry.

use std::sync::Arc;

use mc_01_peer_registry::{PeerId, PeerRegistry, PeerTransport};
use mc_08_consensus::PeerBroadcast;
use mc_13_chain_sync::PeerSender;
use tracing::debug;

/// Adapter exposing [`PeerRegistry`] to consensus and chain sync.
#[derive(Debug, Clone)]
pub struct RegistryAdapter {
    registry: Arc<PeerRegistry>,
}

impl RegistryAdapter {
    pub fn new(registry: Arc<PeerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }
}

impl PeerBroadcast for RegistryAdapter {
    fn broadcast(&self, line: &str) -> usize {
        self.registry.broadcast(line)
    }

    fn peer_count(&self) -> usize {
        self.registry.peer_count()
    }
}

impl PeerSender for RegistryAdapter {
    type Peer = PeerId;

    fn send_to(&self, peer: PeerId, line: &str) -> bool {
        match self.registry.send_to(peer, line) {
            Ok(()) => true,
            Err(e) => {
                debug!(%peer, error = %e, "Send to peer failed");
                false
            }
        }
    }

    fn broadcast(&self, line: &str) -> usize {
        self.registry.broadcast(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_01_peer_registry::TransportConfig;

    #[tokio::test]
    async fn test_empty_registry() {
        let adapter = RegistryAdapter::new(PeerRegistry::new(TransportConfig::default()));
        assert_eq!(PeerBroadcast::peer_count(&adapter), 0);
        assert_eq!(PeerBroadcast::broadcast(&adapter, "GET_HEIGHT"), 0);
        assert!(!PeerSender::send_to(&adapter, PeerId(7), "GET_HEIGHT"));
    }
}
