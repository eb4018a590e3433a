//! # Sync Status Adapter
//!
//! Lets consensus refuse to judge proposals while chain sync is running.

use std::sync::Arc;

use mc_08_consensus::SyncStatus;
use mc_13_chain_sync::ChainSyncApi;

use crate::container::ConcreteChainSync;

/// Adapter implementing mc-08's [`SyncStatus`] over the chain sync service.
pub struct SyncGate {
    sync: Arc<ConcreteChainSync>,
}

impl SyncGate {
    pub fn new(sync: Arc<ConcreteChainSync>) -> Self {
        Self { sync }
    }
}

impl SyncStatus for SyncGate {
    fn is_syncing(&self) -> bool {
        self.sync.is_syncing()
    }
}
