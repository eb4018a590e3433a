//! # MedChain Node Runtime
//!
//! Wires the subsystems of one node together and hosts the operator shell.
//! The `mc-node` binary in `main.rs` is a thin wrapper around this library.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and the subsystem container
//! - `genesis/` - ledger bootstrap and genesis block creation
//! - `adapters/` - outbound port implementations over the peer registry
//! - `dispatcher` - routes peer protocol lines to sync and consensus
//! - `node` - startup and shutdown
//! - `control` - interactive operator commands
//!
//! ## Message Flow
//!
//! ```text
//! TCP peer ──line──→ mc-01 PeerRegistry ──→ ProtocolDispatcher
//!                                             │
//!              ┌──────────────────────────────┴──────────────┐
//!              ↓                                             ↓
//!   mc-13 ChainSync (heights, backfill)       mc-08 Consensus (propose/vote/commit)
//!              │                                             │
//!              └──────────────→ mc-02 LedgerStore ←──────────┘
//! ```

pub mod adapters;
pub mod container;
pub mod control;
pub mod dispatcher;
pub mod genesis;
pub mod node;

pub use container::{NodeConfig, NodeContainer};
pub use control::{Command, ControlShell};
pub use dispatcher::ProtocolDispatcher;
pub use node::{NodeError, NodeRuntime};
