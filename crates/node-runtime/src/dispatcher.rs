//! # Protocol Dispatcher
//!
//! Receives every line read by the peer registry, parses it once into a
//! [`Message`] and routes it to chain sync or consensus.
//!
//! | Message | Handled by |
//! |---------|------------|
//! | `GET_HEIGHT`, `CHAIN_HEIGHT`, `GET_BLOCK`, `SYNC_BLOCK` | mc-13 chain sync |
//! | `PROPOSE_BLOCK`, `BLOCK_VOTE`, `COMMIT_BLOCK` | mc-08 consensus |
//!
//! Lines that do not parse are counted and dropped, except a proposal whose
//! block cannot be decoded, which is answered with `BLOCK_VOTE:REJECT`.

use std::sync::Arc;

use async_trait::async_trait;
use mc_01_peer_registry::{LineHandler, PeerId, PeerRegistry, PeerTransport};
use mc_02_ledger_store::{LedgerApi, LedgerStore};
use mc_05_wire_protocol::{Message, MessageKind, ParseError, Vote};
use mc_08_consensus::{CommitOutcome, ConsensusApi, ConsensusError, ProposalOutcome};
use mc_13_chain_sync::{ChainSyncApi, HeightOutcome, SyncBlockOutcome};
use mc_telemetry::{log_block_event, log_peer_event, MALFORMED_MESSAGES};
use shared_types::Block;
use tracing::{info, warn};

use crate::container::{ConcreteChainSync, ConcreteConsensus, NodeContainer};

const SUBSYSTEM: &str = "dispatcher";

/// Routes inbound protocol lines to the subsystems.
pub struct ProtocolDispatcher {
    ledger: Arc<LedgerStore>,
    registry: Arc<PeerRegistry>,
    consensus: Arc<ConcreteConsensus>,
    sync: Arc<ConcreteChainSync>,
}

impl ProtocolDispatcher {
    pub fn new(container: &NodeContainer) -> Self {
        Self {
            ledger: Arc::clone(&container.ledger),
            registry: Arc::clone(&container.registry),
            consensus: Arc::clone(&container.consensus),
            sync: Arc::clone(&container.sync),
        }
    }

    /// Handle one protocol line from `peer`.
    pub fn dispatch(&self, peer: PeerId, line: &str) {
        let message = match Message::parse(line) {
            Ok(message) => message,
            Err(ParseError::MalformedBlock { kind, source })
                if kind == MessageKind::ProposeBlock.keyword() =>
            {
                MALFORMED_MESSAGES.inc();
                log_peer_event!(warn, SUBSYSTEM, "Undecodable proposal rejected", peer, error = %source);
                self.send_vote(peer, Vote::Reject);
                return;
            }
            Err(e) => {
                MALFORMED_MESSAGES.inc();
                log_peer_event!(debug, SUBSYSTEM, "Discarding unparseable line", peer, error = %e);
                return;
            }
        };

        match message {
            Message::GetHeight => {
                if let Err(e) = self.sync.on_get_height(peer) {
                    log_peer_event!(debug, SUBSYSTEM, "Height reply failed", peer, error = %e);
                }
            }
            Message::ChainHeight(height) => self.on_chain_height(peer, height),
            Message::GetBlock(index) => match self.sync.on_get_block(peer, index) {
                Ok(true) => {}
                Ok(false) => {
                    log_peer_event!(debug, SUBSYSTEM, "Requested block not held", peer, index)
                }
                Err(e) => {
                    log_peer_event!(debug, SUBSYSTEM, "Block reply failed", peer, index, error = %e)
                }
            },
            Message::SyncBlock(block) => self.on_sync_block(peer, &block),
            Message::ProposeBlock(block) => {
                let vote = self.consensus.cast_vote(&block);
                self.send_vote(peer, vote);
            }
            Message::BlockVote(vote) => self.on_vote(peer, vote),
            Message::CommitBlock(block) => self.on_commit(peer, &block),
        }
    }

    fn on_chain_height(&self, peer: PeerId, height: u64) {
        match self.sync.on_chain_height(peer, height) {
            HeightOutcome::Requested { index } => {
                log_peer_event!(info, SUBSYSTEM, "Peer is ahead, sync started", peer, height, next = index)
            }
            HeightOutcome::PeerUnreachable => {
                log_peer_event!(warn, SUBSYSTEM, "Sync peer unreachable", peer, height)
            }
            HeightOutcome::UpToDate | HeightOutcome::AlreadySyncing => {}
        }
    }

    fn on_sync_block(&self, peer: PeerId, block: &Block) {
        match self.sync.on_sync_block(peer, block) {
            SyncBlockOutcome::Ignored(reason) => {
                log_peer_event!(debug, SUBSYSTEM, "Sync block ignored", peer, index = block.index, reason = %reason)
            }
            SyncBlockOutcome::Aborted { index, reason } => {
                log_peer_event!(warn, SUBSYSTEM, "Sync aborted", peer, index, reason = %reason)
            }
            SyncBlockOutcome::Appended { .. } | SyncBlockOutcome::Completed { .. } => {}
        }
    }

    fn on_vote(&self, peer: PeerId, vote: Vote) {
        match self.consensus.register_vote(vote) {
            Ok(ProposalOutcome::Committed { index, block_hash }) => {
                log_block_event!(info, SUBSYSTEM, "Proposal committed", index, block_hash, last_vote_from = %peer)
            }
            Ok(ProposalOutcome::Abandoned { index }) => {
                info!(index, "Proposal abandoned, majority no longer reachable")
            }
            Ok(ProposalOutcome::Pending { .. }) | Ok(ProposalOutcome::Ignored) => {}
            Err(e) => warn!(%peer, error = %e, "Committing proposal failed"),
        }
    }

    fn on_commit(&self, peer: PeerId, block: &Block) {
        match self.consensus.handle_commit(block) {
            Ok(CommitOutcome::Applied { .. }) | Ok(CommitOutcome::Duplicate { .. }) => {}
            // A commit from further ahead means this node missed blocks. A
            // running backfill already covers them.
            Err(ConsensusError::NotAnExtension(_)) | Err(ConsensusError::Ledger(_))
                if block.index > self.ledger.height() =>
            {
                if self.sync.is_syncing() {
                    log_peer_event!(debug, SUBSYSTEM, "Commit ahead of local chain during sync", peer, index = block.index);
                } else {
                    log_peer_event!(info, SUBSYSTEM, "Commit ahead of local chain, resyncing", peer, index = block.index);
                    self.sync.initiate();
                }
            }
            Err(e) => {
                log_peer_event!(warn, SUBSYSTEM, "Peer commit refused", peer, index = block.index, error = %e)
            }
        }
    }

    fn send_vote(&self, peer: PeerId, vote: Vote) {
        let line = match Message::BlockVote(vote).render() {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to render vote");
                return;
            }
        };
        if let Err(e) = self.registry.send_to(peer, &line) {
            log_peer_event!(debug, SUBSYSTEM, "Vote not delivered", peer, error = %e);
        }
    }
}

#[async_trait]
impl LineHandler for ProtocolDispatcher {
    async fn on_line(&self, peer: PeerId, line: String) {
        self.dispatch(peer, &line);
    }

    async fn on_disconnect(&self, peer: PeerId) {
        self.sync.on_peer_disconnected(peer);
    }
}
