//! Driving port: protocol events routed to chain sync.

use shared_types::Block;

use crate::domain::{HeightOutcome, SyncBlockOutcome, SyncError, SyncSession};

pub trait ChainSyncApi<P>: Send + Sync {
    /// Ask every peer for its height. Returns how many peers were asked.
    fn initiate(&self) -> usize;

    /// Drop any running session, then [`ChainSyncApi::initiate`].
    fn retrigger(&self) -> usize;

    /// Answer a peer's `GET_HEIGHT`.
    fn on_get_height(&self, peer: P) -> Result<(), SyncError>;

    /// A peer reported its height.
    fn on_chain_height(&self, peer: P, height: u64) -> HeightOutcome;

    /// Answer a peer's `GET_BLOCK`. Returns false if the block does not exist.
    fn on_get_block(&self, peer: P, index: u64) -> Result<bool, SyncError>;

    /// A backfill block arrived.
    fn on_sync_block(&self, peer: P, block: &Block) -> SyncBlockOutcome;

    /// A peer went away.
    fn on_peer_disconnected(&self, peer: P);

    fn is_syncing(&self) -> bool;

    fn session(&self) -> Option<SyncSession<P>>;
}
