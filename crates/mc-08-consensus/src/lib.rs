//! # Consensus (mc-08)
//!
//! Proof-of-authority majority commit: one node proposes a signed block, every
//! peer votes, and the proposer commits once a majority of the live network
//! (itself included) approved.
//!
//! ## Architecture
//!
//! ```text
//! control shell ──propose──→ [ConsensusService] ──PROPOSE_BLOCK──→ peers
//! peers ──BLOCK_VOTE──────→        │
//!                                  ├── majority reached ──try_extend──→ Ledger Store (2)
//!                                  └──COMMIT_BLOCK──→ peers
//! peers ──COMMIT_BLOCK────→ handle_commit ──try_extend──→ Ledger Store (2)
//! ```
//!
//! ## State Machine
//!
//! `Idle → Proposing → Idle`. A second `propose` while proposing is refused;
//! a vote while idle is a no-op.
//!
//! ## Majority
//!
//! `majority(P) = floor((P + 1) / 2) + 1` for `P` connected peers, recomputed
//! from the live peer count at every vote.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - state machine, majority rule, ordered proposal checks, errors
//! - `ports/` - `ConsensusApi` (inbound), `PeerBroadcast` + `SyncStatus` (outbound)
//! - `service/` - `ConsensusService`

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    evaluate_proposal, majority, CommitOutcome, ConsensusError, ConsensusResult, Proposal,
    ProposalOutcome, ProposalState, RejectReason, Tally,
};
pub use ports::inbound::ConsensusApi;
pub use ports::outbound::{PeerBroadcast, SyncStatus};
pub use service::{ConsensusDependencies, ConsensusService};
