//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Bind the listening socket (its port is the validator identity)
//! 2. Open the ledger and create genesis if it is empty (fatal on failure)
//! 3. Wire the subsystems and start accepting peers
//! 4. Dial each bootstrap peer once
//! 5. Broadcast `GET_HEIGHT` to start chain sync

use std::sync::Arc;

use mc_01_peer_registry::{
    LineHandler, PeerId, PeerRegistry, PeerTransport, TransportConfig, TransportError,
};
use mc_02_ledger_store::{LedgerApi, LedgerStore};
use mc_13_chain_sync::ChainSyncApi;
use shared_crypto::AuthorityKeys;
use shared_types::ValidatorId;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::container::{
    parse_peer, ConcreteChainSync, ConcreteConsensus, NodeConfig, NodeContainer,
};
use crate::dispatcher::ProtocolDispatcher;
use crate::genesis::{bootstrap_ledger, GenesisError};

/// Node startup errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to read listening address: {0}")]
    LocalAddr(#[source] std::io::Error),

    #[error(transparent)]
    Genesis(#[from] GenesisError),
}

/// A running MedChain node.
pub struct NodeRuntime {
    config: NodeConfig,
    container: NodeContainer,
    handler: Arc<dyn LineHandler>,
    accept_task: JoinHandle<()>,
}

impl NodeRuntime {
    /// Bind `listen_host:port` and start the node.
    pub async fn start(config: NodeConfig, keys: Arc<dyn AuthorityKeys>) -> Result<Self, NodeError> {
        let addr = format!("{}:{}", config.network.listen_host, config.network.port);
        let listener = PeerRegistry::bind(&addr).await?;
        Self::start_with_listener(config, listener, keys).await
    }

    /// Start the node on an already bound listener.
    ///
    /// The listener's actual port replaces `config.network.port`, so a
    /// listener bound to port 0 works.
    pub async fn start_with_listener(
        mut config: NodeConfig,
        listener: TcpListener,
        keys: Arc<dyn AuthorityKeys>,
    ) -> Result<Self, NodeError> {
        let port = listener.local_addr().map_err(NodeError::LocalAddr)?.port();
        config.network.port = port;
        let validator = ValidatorId(port);

        info!("===========================================");
        info!("  MedChain node v{}", env!("CARGO_PKG_VERSION"));
        info!("  Validator: {}", validator);
        info!("===========================================");

        let ledger = Arc::new(bootstrap_ledger(&config, validator, keys)?);

        let transport = TransportConfig {
            max_peers: config.network.max_peers,
            max_line_bytes: config.network.max_line_bytes,
        };
        let container = NodeContainer::new(validator, ledger, transport);

        let dispatcher = Arc::new(ProtocolDispatcher::new(&container));
        let handler: Arc<dyn LineHandler> = dispatcher;
        let accept_task = container
            .registry
            .spawn_accept_loop(listener, Arc::clone(&handler));

        let runtime = Self {
            config,
            container,
            handler,
            accept_task,
        };

        for peer in &runtime.config.network.bootstrap_peers {
            let (host, port) = match parse_peer(peer) {
                Ok(target) => target,
                Err(e) => {
                    warn!(error = %e, "Skipping bootstrap peer");
                    continue;
                }
            };
            if let Err(e) = runtime.connect(&host, port).await {
                warn!(error = %e, "Bootstrap peer unavailable");
            }
        }

        let asked = runtime.container.sync.initiate();
        info!(
            port,
            height = runtime.container.ledger.height(),
            peers = asked,
            "Node started"
        );
        Ok(runtime)
    }

    /// Dial a peer once.
    pub async fn connect(&self, host: &str, port: u16) -> Result<PeerId, TransportError> {
        self.container
            .registry
            .connect(host, port, Arc::clone(&self.handler))
            .await
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn port(&self) -> u16 {
        self.config.network.port
    }

    pub fn validator(&self) -> ValidatorId {
        self.container.validator
    }

    pub fn container(&self) -> &NodeContainer {
        &self.container
    }

    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.container.ledger
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.container.registry
    }

    pub fn consensus(&self) -> &Arc<ConcreteConsensus> {
        &self.container.consensus
    }

    pub fn sync(&self) -> &Arc<ConcreteChainSync> {
        &self.container.sync
    }

    /// Stop accepting peers and drop every connection.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        self.accept_task.abort();
        for peer in self.container.registry.peers() {
            self.container.registry.remove(peer.id);
        }
        info!("Shutdown complete");
    }
}

impl Drop for NodeRuntime {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}
