//! # Subsystem Container
//!
//! Holds the subsystem instances of one node.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Ledger Store (opened and bootstrapped before the container)
//! Level 1: Peer Registry
//! Level 2: Chain Sync (ledger + registry)
//! Level 3: Consensus (ledger + registry + sync status)
//! ```

use std::sync::Arc;

use mc_01_peer_registry::{PeerRegistry, TransportConfig};
use mc_02_ledger_store::LedgerStore;
use mc_08_consensus::{ConsensusDependencies, ConsensusService};
use mc_13_chain_sync::ChainSyncService;
use shared_types::ValidatorId;
use tracing::info;

use crate::adapters::{RegistryAdapter, SyncGate};

/// Chain sync wired to the file-backed ledger and the peer registry.
pub type ConcreteChainSync = ChainSyncService<LedgerStore, RegistryAdapter>;

/// Consensus wired to the ledger, the peer registry and chain sync.
pub type ConcreteConsensus = ConsensusService<LedgerStore, RegistryAdapter, SyncGate>;

/// Central container holding every subsystem of one node.
pub struct NodeContainer {
    /// Identity this node signs with.
    pub validator: ValidatorId,
    pub ledger: Arc<LedgerStore>,
    pub registry: Arc<PeerRegistry>,
    pub sync: Arc<ConcreteChainSync>,
    pub consensus: Arc<ConcreteConsensus>,
}

impl NodeContainer {
    pub fn new(validator: ValidatorId, ledger: Arc<LedgerStore>, transport: TransportConfig) -> Self {
        let registry = PeerRegistry::new(transport);
        let peers = Arc::new(RegistryAdapter::new(Arc::clone(&registry)));

        let sync = Arc::new(ChainSyncService::new(Arc::clone(&ledger), Arc::clone(&peers)));

        let consensus = Arc::new(ConsensusService::new(ConsensusDependencies {
            ledger: Arc::clone(&ledger),
            peers,
            sync: Arc::new(SyncGate::new(Arc::clone(&sync))),
        }));

        info!(%validator, "Subsystems initialized");

        Self {
            validator,
            ledger,
            registry,
            sync,
            consensus,
        }
    }
}
