//! # MedChain Test Suite
//!
//! Cross-crate tests that run real nodes against each other over loopback.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Node cluster helpers
//! └── integration/
//!     ├── scenarios.rs  # End-to-end startup, proposal, rejection, sync, tamper
//!     └── consensus.rs  # Voting edge cases across nodes
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mc-tests
//! cargo test -p mc-tests integration::scenarios::
//! ```

pub mod harness;
pub mod integration;
