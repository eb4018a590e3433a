//! # Shared Types Crate
//!
//! This crate contains the ledger data model used by every MedChain subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Transaction` and `Block` are defined once here.
//! - **Immutable Once Sealed**: a block's fingerprint covers every content field,
//!   so any later mutation is detectable by recomputing it.
//! - **Authority Identity**: validators are identified by their node port.

pub mod entities;
pub mod errors;
pub mod fingerprint;

pub use entities::*;
pub use errors::*;
pub use fingerprint::{block_fingerprint, is_fingerprint, sha256_hex, FINGERPRINT_HEX_LEN};
