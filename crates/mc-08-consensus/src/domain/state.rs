//! Proposal state machine.

use mc_05_wire_protocol::Vote;
use shared_types::Block;

use super::{majority, ConsensusError, ConsensusResult};

/// The single outstanding local proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub block: Block,
    /// Includes the proposer's own implicit approval.
    pub approvals: usize,
    pub rejections: usize,
}

/// What a propose or vote call led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Vote arrived with no proposal outstanding.
    Ignored,
    Pending { approvals: usize, needed: usize },
    Committed { index: u64, block_hash: String },
    /// Majority can no longer be reached; the proposal was dropped.
    Abandoned { index: u64 },
}

/// What applying a peer's commit led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied { index: u64 },
    /// A block with this index already exists locally.
    Duplicate { index: u64 },
}

/// `Idle → Proposing → Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProposalState {
    #[default]
    Idle,
    Proposing(Proposal),
}

/// Result of settling the state against the current peer count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tally {
    /// No proposal outstanding.
    Ignored,
    /// Still waiting for votes.
    Pending { approvals: usize, needed: usize },
    /// Majority reached; the state is back to idle and the block must be committed.
    Reached(Block),
    /// Too many rejections for the current membership to ever reach majority.
    Unreachable(Block),
}

impl ProposalState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ProposalState::Idle)
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        match self {
            ProposalState::Idle => None,
            ProposalState::Proposing(p) => Some(p),
        }
    }

    /// Enter `Proposing` with the proposer's approval already counted.
    pub fn begin(&mut self, block: Block) -> ConsensusResult<()> {
        if let ProposalState::Proposing(p) = self {
            return Err(ConsensusError::AlreadyProposing {
                index: p.block.index,
            });
        }
        *self = ProposalState::Proposing(Proposal {
            block,
            approvals: 1,
            rejections: 0,
        });
        Ok(())
    }

    /// Count one vote, then settle.
    pub fn tally(&mut self, vote: Vote, peer_count: usize) -> Tally {
        match self {
            ProposalState::Idle => return Tally::Ignored,
            ProposalState::Proposing(p) => match vote {
                Vote::Approve => p.approvals += 1,
                Vote::Reject => p.rejections += 1,
            },
        }
        self.settle(peer_count)
    }

    /// Compare the tally with the majority for `peer_count` peers.
    pub fn settle(&mut self, peer_count: usize) -> Tally {
        let (approvals, rejections) = match self {
            ProposalState::Idle => return Tally::Ignored,
            ProposalState::Proposing(p) => (p.approvals, p.rejections),
        };
        let needed = majority(peer_count);
        let nodes = peer_count + 1;
        let undecided = nodes.saturating_sub(approvals + rejections);

        if approvals >= needed {
            self.take().map_or(Tally::Ignored, Tally::Reached)
        } else if approvals + undecided < needed {
            // Final: a later disconnect that lowers `needed` does not revive it.
            self.take().map_or(Tally::Ignored, Tally::Unreachable)
        } else {
            Tally::Pending { approvals, needed }
        }
    }

    /// Drop the proposal if the chain already has a block at its index.
    pub fn supersede(&mut self, height: u64) -> Option<Block> {
        let stale = matches!(self, ProposalState::Proposing(p) if p.block.index < height);
        if stale {
            self.take()
        } else {
            None
        }
    }

    fn take(&mut self) -> Option<Block> {
        match std::mem::take(self) {
            ProposalState::Proposing(p) => Some(p.block),
            ProposalState::Idle => None,
        }
    }
}
