//! # Chain Sync Service
//!
//! The session lock is held across the ledger append of a backfill block so
//! that two blocks from the sync peer cannot interleave. Lock order is always
//! session → ledger.


use std::sync::Arc;

use mc_02_ledger_store::LedgerApi;
use mc_05_wire_protocol::Message;
use mc_telemetry::{log_block_event, log_peer_event, metrics};
use parking_lot::Mutex;
use shared_types::Block;
use tracing::{debug, info};

use crate::domain::{
    HeightOutcome, IgnoreReason, SyncBlockOutcome, SyncError, SyncSession, SyncState,
};
use crate::ports::inbound::ChainSyncApi;
use crate::ports::outbound::PeerSender;

const SUBSYSTEM: &str = "mc-13";

pub struct ChainSyncService<L, T>
where
    L: LedgerApi,
    T: PeerSender,
{
    ledger: Arc<L>,
    peers: Arc<T>,
    state: Mutex<SyncState<T::Peer>>,
}

impl<L, T> ChainSyncService<L, T>
where
    L: LedgerApi,
    T: PeerSender,
{
    pub fn new(ledger: Arc<L>, peers: Arc<T>) -> Self {
        Self {
            ledger,
            peers,
            state: Mutex::new(SyncState::Idle),
        }
    }

    fn request_block(&self, peer: T::Peer, index: u64) -> bool {
        Message::GetBlock(index)
            .render()
            .is_ok_and(|line| self.peers.send_to(peer, &line))
    }

    fn reply(&self, peer: T::Peer, message: Message) -> Result<(), SyncError> {
        let line = message.render()?;
        if self.peers.send_to(peer, &line) {
            Ok(())
        } else {
            Err(SyncError::PeerGone {
                peer: peer.to_string(),
            })
        }
    }
}

impl<L, T> ChainSyncApi<T::Peer> for ChainSyncService<L, T>
where
    L: LedgerApi,
    T: PeerSender,
{
    fn initiate(&self) -> usize {
        let asked = Message::GetHeight
            .render()
            .map_or(0, |line| self.peers.broadcast(&line));
        info!(peers = asked, "[mc-13] Initiating chain synchronization");
        asked
    }

    fn retrigger(&self) -> usize {
        if let Some(stale) = self.state.lock().reset() {
            log_peer_event!(info, SUBSYSTEM, "[mc-13] Dropping running sync session", stale.peer, target = stale.target);
        }
        self.initiate()
    }

    fn on_get_height(&self, peer: T::Peer) -> Result<(), SyncError> {
        self.reply(peer, Message::ChainHeight(self.ledger.height()))
    }

    fn on_chain_height(&self, peer: T::Peer, peer_height: u64) -> HeightOutcome {
        let mut state = self.state.lock();
        if state.is_syncing() {
            return HeightOutcome::AlreadySyncing;
        }
        let height = self.ledger.height();
        if peer_height <= height {
            debug!(peer_height, height, "[mc-13] Peer not ahead");
            return HeightOutcome::UpToDate;
        }

        log_peer_event!(
            info,
            SUBSYSTEM,
            "[mc-13] Peer chain ahead, starting sync",
            peer,
            peer_height,
            local_height = height
        );
        *state = SyncState::Syncing(SyncSession {
            peer,
            target: peer_height,
        });
        if self.request_block(peer, height) {
            HeightOutcome::Requested { index: height }
        } else {
            state.reset();
            HeightOutcome::PeerUnreachable
        }
    }

    fn on_get_block(&self, peer: T::Peer, index: u64) -> Result<bool, SyncError> {
        let Some(block) = self.ledger.block_by_index(index) else {
            debug!(index, "[mc-13] Requested block not found");
            return Ok(false);
        };
        self.reply(peer, Message::SyncBlock(block))?;
        Ok(true)
    }

    fn on_sync_block(&self, peer: T::Peer, block: &Block) -> SyncBlockOutcome {
        let mut state = self.state.lock();
        let session = match state.session() {
            None => return SyncBlockOutcome::Ignored(IgnoreReason::NotSyncing),
            Some(s) if s.peer != peer => {
                return SyncBlockOutcome::Ignored(IgnoreReason::NotSyncPeer)
            }
            Some(s) => s,
        };

        let height = self.ledger.height();
        if block.index != height {
            debug!(
                expected = height,
                found = block.index,
                "[mc-13] Out-of-order block ignored"
            );
            return SyncBlockOutcome::Ignored(IgnoreReason::OutOfOrder {
                expected: height,
                found: block.index,
            });
        }

        if let Err(e) = self.ledger.try_extend(block) {
            state.reset();
            metrics::SYNC_ABORTS.inc();
            log_block_event!(
                warn,
                SUBSYSTEM,
                "[mc-13] Sync block rejected, aborting sync",
                block.index,
                block.block_hash,
                error = %e
            );
            return SyncBlockOutcome::Aborted {
                index: block.index,
                reason: e.to_string(),
            };
        }
        metrics::SYNC_BLOCKS_ACCEPTED.inc();
        log_block_event!(info, SUBSYSTEM, "[mc-13] Sync block appended", block.index, block.block_hash);

        let next = block.index + 1;
        if next >= session.target {
            state.reset();
            info!(height = next, "[mc-13] Synchronization complete");
            return SyncBlockOutcome::Completed { height: next };
        }

        if !self.request_block(peer, next) {
            state.reset();
            log_peer_event!(warn, SUBSYSTEM, "[mc-13] Sync peer gone mid-session", peer);
        }
        SyncBlockOutcome::Appended {
            index: block.index,
            next,
        }
    }

    fn on_peer_disconnected(&self, peer: T::Peer) {
        let mut state = self.state.lock();
        if state.is_sync_peer(peer) {
            state.reset();
            log_peer_event!(info, SUBSYSTEM, "[mc-13] Sync peer disconnected, session cleared", peer);
        }
    }

    fn is_syncing(&self) -> bool {
        self.state.lock().is_syncing()
    }

    fn session(&self) -> Option<SyncSession<T::Peer>> {
        self.state.lock().session()
    }
}
