//! # Content Fingerprints
//!
//! SHA-256 digests of off-chain record payloads, rendered as 64 lowercase hex
//! characters. This is the value stored in `Transaction::data_hash` and the key
//! of the chain's duplicate-record check.

use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Stateful SHA-256 hasher for payloads read in chunks.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Consume every byte of `reader`.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> io::Result<&mut Self> {
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                return Ok(self);
            }
            self.inner.update(&buf[..n]);
        }
    }

    /// Finalize into lowercase hex.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// One-shot content fingerprint of `data`.
pub fn content_fingerprint(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize_hex()
}
