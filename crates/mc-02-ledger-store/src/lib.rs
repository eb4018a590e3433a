//! # Ledger Store (mc-02)
//!
//! The authoritative, append-only chain of blocks for one node.
//!
//! ## Architecture
//!
//! ```text
//! Consensus (8) ──try_extend──→ ┐
//! Chain Sync (13) ─try_extend─→ ├──→ [LedgerStore] ──append──→ BlockLog (file)
//! Control shell ──queries────→ ┘        │
//!                                       └── in-memory mirror (reads)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Genesis Anchor | `blocks[0].previous_hash == "0"` |
//! | 2 | Recomputed Linkage | `previous_hash` equals the recomputed fingerprint of the predecessor |
//! | 3 | Content Integrity | `block_hash` equals the recomputed fingerprint |
//! | 4 | Authority | Signature verifies against the declared validator's key |
//! | 5 | Unique Records | A `data_hash` appears at most once in the chain |
//! | 6 | Append Only | No block is ever modified or removed |
//!
//! Every block entering the chain after genesis passes the same
//! [`LedgerStore::check_extension`] gate; [`LedgerStore::verify_chain`]
//! applies the identical rules to the persisted chain from block 0.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - errors, chain rules, genesis, record framing
//! - `ports/` - `LedgerApi` (inbound), `BlockLog` (outbound)
//! - `adapters/` - file-backed and in-memory block logs
//! - `service/` - `LedgerStore`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBlockLog, InMemoryBlockLog};
pub use domain::errors::{ChainFault, FaultReason, LedgerError, LedgerResult};
pub use domain::genesis::{build_genesis, GENESIS_TIMESTAMP};
pub use ports::inbound::LedgerApi;
pub use ports::outbound::{BlockLog, LogRecord};
pub use service::LedgerStore;
