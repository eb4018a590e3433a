//! # Consensus Service
//!
//! Lock order: the proposal lock may be held while asking the peer table for
//! its count, never while calling into the ledger. Ledger calls happen after
//! the proposal state has been settled and released.


use std::sync::Arc;

use mc_02_ledger_store::LedgerApi;
use mc_05_wire_protocol::{Message, Vote};
use mc_telemetry::{log_block_event, metrics};
use parking_lot::Mutex;
use shared_types::Block;
use tracing::{debug, info, warn};

use crate::domain::{
    evaluate_proposal, CommitOutcome, ConsensusResult, ProposalOutcome, ProposalState,
    RejectReason, Tally,
};
use crate::ports::inbound::ConsensusApi;
use crate::ports::outbound::{PeerBroadcast, SyncStatus};

const SUBSYSTEM: &str = "mc-08";

/// Dependencies for [`ConsensusService`].
pub struct ConsensusDependencies<L, P, S> {
    pub ledger: Arc<L>,
    pub peers: Arc<P>,
    pub sync: Arc<S>,
}

/// The proposal/vote engine.
pub struct ConsensusService<L, P, S>
where
    L: LedgerApi,
    P: PeerBroadcast,
    S: SyncStatus,
{
    ledger: Arc<L>,
    peers: Arc<P>,
    sync: Arc<S>,
    state: Mutex<ProposalState>,
}

impl<L, P, S> ConsensusService<L, P, S>
where
    L: LedgerApi,
    P: PeerBroadcast,
    S: SyncStatus,
{
    pub fn new(deps: ConsensusDependencies<L, P, S>) -> Self {
        Self {
            ledger: deps.ledger,
            peers: deps.peers,
            sync: deps.sync,
            state: Mutex::new(ProposalState::Idle),
        }
    }

    fn resolve(&self, tally: Tally) -> ConsensusResult<ProposalOutcome> {
        match tally {
            Tally::Ignored => Ok(ProposalOutcome::Ignored),
            Tally::Pending { approvals, needed } => {
                debug!(approvals, needed, "[mc-08] Waiting for votes");
                Ok(ProposalOutcome::Pending { approvals, needed })
            }
            Tally::Unreachable(block) => {
                log_block_event!(
                    warn,
                    SUBSYSTEM,
                    "[mc-08] Proposal rejected by peers, abandoning",
                    block.index,
                    block.block_hash
                );
                Ok(ProposalOutcome::Abandoned { index: block.index })
            }
            Tally::Reached(block) => self.commit(block),
        }
    }

    fn commit(&self, block: Block) -> ConsensusResult<ProposalOutcome> {
        if let Err(e) = self.ledger.try_extend(&block) {
            log_block_event!(
                warn,
                SUBSYSTEM,
                "[mc-08] Majority reached but block no longer extends the chain",
                block.index,
                block.block_hash,
                error = %e
            );
            return Err(e.into());
        }
        metrics::COMMITS_APPLIED.inc();

        let line = Message::CommitBlock(block.clone()).render()?;
        let reached = self.peers.broadcast(&line);
        log_block_event!(
            info,
            SUBSYSTEM,
            "[mc-08] Majority reached, block committed",
            block.index,
            block.block_hash,
            peers = reached
        );
        Ok(ProposalOutcome::Committed {
            index: block.index,
            block_hash: block.block_hash,
        })
    }
}

impl<L, P, S> ConsensusApi for ConsensusService<L, P, S>
where
    L: LedgerApi,
    P: PeerBroadcast,
    S: SyncStatus,
{
    /// A node without peers commits on its own approval before this returns.
    fn propose(&self, block: Block) -> ConsensusResult<ProposalOutcome> {
        self.ledger.check_extension(&block)?;
        let line = Message::ProposeBlock(block.clone()).render()?;
        let index = block.index;
        let block_hash = block.block_hash.clone();

        self.state.lock().begin(block)?;

        let reached = self.peers.broadcast(&line);
        metrics::PROPOSALS_SENT.inc();
        log_block_event!(
            info,
            SUBSYSTEM,
            "[mc-08] Block proposed",
            index,
            block_hash,
            peers = reached
        );

        let peer_count = self.peers.peer_count();
        let tally = self.state.lock().settle(peer_count);
        self.resolve(tally)
    }

    fn register_vote(&self, vote: Vote) -> ConsensusResult<ProposalOutcome> {
        metrics::VOTES_RECEIVED
            .with_label_values(&[vote.label()])
            .inc();
        let peer_count = self.peers.peer_count();
        let tally = self.state.lock().tally(vote, peer_count);
        if tally == Tally::Ignored {
            debug!(vote = vote.as_str(), "[mc-08] Vote with no outstanding proposal ignored");
        }
        self.resolve(tally)
    }

    fn evaluate_proposal(&self, block: &Block) -> Result<(), RejectReason> {
        let proposing = self.state.lock().proposal().is_some();
        evaluate_proposal(block, self.sync.is_syncing(), proposing, self.ledger.as_ref())
    }

    fn cast_vote(&self, block: &Block) -> Vote {
        let vote = match ConsensusApi::evaluate_proposal(self, block) {
            Ok(()) => {
                log_block_event!(info, SUBSYSTEM, "[mc-08] Proposal approved", block.index, block.block_hash);
                Vote::Approve
            }
            Err(reason) => {
                log_block_event!(
                    warn,
                    SUBSYSTEM,
                    "[mc-08] Proposal rejected",
                    block.index,
                    block.block_hash,
                    reason = %reason
                );
                Vote::Reject
            }
        };
        metrics::VOTES_CAST.with_label_values(&[vote.label()]).inc();
        vote
    }

    fn handle_commit(&self, block: &Block) -> ConsensusResult<CommitOutcome> {
        let outcome = if self.ledger.block_by_index(block.index).is_some() {
            CommitOutcome::Duplicate { index: block.index }
        } else {
            match self.ledger.try_extend(block) {
                Ok(()) => {
                    metrics::COMMITS_APPLIED.inc();
                    log_block_event!(info, SUBSYSTEM, "[mc-08] Peer commit applied", block.index, block.block_hash);
                    CommitOutcome::Applied { index: block.index }
                }
                // Lost the race against another commit for the same index.
                Err(_) if self.ledger.block_by_index(block.index).is_some() => {
                    CommitOutcome::Duplicate { index: block.index }
                }
                Err(e) => {
                    log_block_event!(
                        warn,
                        SUBSYSTEM,
                        "[mc-08] Peer commit refused",
                        block.index,
                        block.block_hash,
                        error = %e
                    );
                    return Err(e.into());
                }
            }
        };

        if let CommitOutcome::Duplicate { index } = outcome {
            metrics::DUPLICATE_COMMITS.inc();
            debug!(index, "[mc-08] Duplicate commit ignored");
        }

        let height = self.ledger.height();
        if let Some(stale) = self.state.lock().supersede(height) {
            info!(index = stale.index, "[mc-08] Local proposal superseded by peer commit");
        }
        Ok(outcome)
    }

    fn outstanding(&self) -> Option<Block> {
        self.state.lock().proposal().map(|p| p.block.clone())
    }
}
