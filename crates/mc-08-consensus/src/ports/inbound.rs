//! Driving port: the consensus API used by the dispatcher and the control shell.

use mc_05_wire_protocol::Vote;
use shared_types::Block;

use crate::domain::{CommitOutcome, ConsensusResult, ProposalOutcome, RejectReason};

pub trait ConsensusApi: Send + Sync {
    /// Start a proposal for a sealed, signed block and broadcast it.
    fn propose(&self, block: Block) -> ConsensusResult<ProposalOutcome>;

    /// Count a vote on the outstanding local proposal.
    fn register_vote(&self, vote: Vote) -> ConsensusResult<ProposalOutcome>;

    /// Run the ordered proposal checks without side effects.
    fn evaluate_proposal(&self, block: &Block) -> Result<(), RejectReason>;

    /// Evaluate a peer's proposal and return the vote to send back.
    fn cast_vote(&self, block: &Block) -> Vote;

    /// Apply a block a peer committed after reaching majority.
    fn handle_commit(&self, block: &Block) -> ConsensusResult<CommitOutcome>;

    /// Outstanding local proposal, if any.
    fn outstanding(&self) -> Option<Block>;
}
