//! # Shared Crypto - Authority Signatures
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Block signing by validators |
//! | `hashing` | SHA-256 | Off-chain record content fingerprints |
//! | `keystore` | - | Key pairs addressed by validator port |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - Secret seeds are zeroized on drop
//! - Verification never errors: any decode or I/O failure is a failed check

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod keystore;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::content_fingerprint;
pub use keystore::{AuthorityKeys, FileKeyStore, InMemoryKeyStore};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
