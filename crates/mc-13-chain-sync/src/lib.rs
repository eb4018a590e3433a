//! # Chain Sync (mc-13)
//!
//! Brings a lagging node up to a peer's height, one block at a time.
//!
//! ## Protocol
//!
//! ```text
//! self ──GET_HEIGHT──────────→ all peers
//! peer ──CHAIN_HEIGHT:n──────→ self      n > height: enter Syncing{peer, n}
//! self ──GET_BLOCK:height────→ peer
//! peer ──SYNC_BLOCK:<block>──→ self      index == height: try_extend, ask for next
//!                                        index != height: discarded
//!                                        chain check fails: sync aborted
//! ```
//!
//! Only one session runs at a time and only the session's peer may feed it.
//! There is no timeout: a peer that stops answering leaves the session open
//! until it disconnects or the operator retriggers sync.
//!
//! The same service answers peers' `GET_HEIGHT` and `GET_BLOCK` requests.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - `SyncState`, outcomes, errors
//! - `ports/` - `ChainSyncApi` (inbound), `PeerSender` (outbound)
//! - `service/` - `ChainSyncService`

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{HeightOutcome, IgnoreReason, SyncBlockOutcome, SyncError, SyncSession, SyncState};
pub use ports::inbound::ChainSyncApi;
pub use ports::outbound::PeerSender;
pub use service::ChainSyncService;
