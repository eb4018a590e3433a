//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports declared by the subsystems.
//!
//! ```text
//! mc-08 PeerBroadcast ─┐
//!                      ├──→ RegistryAdapter ──→ mc-01 PeerRegistry
//! mc-13 PeerSender ────┘
//!
//! mc-08 SyncStatus ─────→ SyncGate ──→ mc-13 ChainSyncService
//! ```

pub mod peers;
pub mod sync_gate;

pub use peers::RegistryAdapter;
pub use sync_gate::SyncGate;
