//! # Authority Key Store
//!
//! Every validator owns one Ed25519 key pair, addressed by the port its node
//! listens on. The ledger only needs two operations from the key material:
//! sign a fingerprint as a validator, and verify a validator's signature.
//!
//! ## Adapters
//!
//! - [`FileKeyStore`]: `<dir>/<port>_private.key` (hex seed) and
//!   `<dir>/<port>_public.key` (hex public key). Public keys of other
//!   validators are distributed out of band by copying their files.
//! - [`InMemoryKeyStore`]: deterministic keys for tests.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use shared_types::ValidatorId;
use tracing::debug;

use crate::signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::CryptoError;

/// Sign and verify on behalf of validators.
pub trait AuthorityKeys: Send + Sync {
    /// Sign `data` with `validator`'s private key; returns hex signature text.
    fn sign(&self, data: &[u8], validator: ValidatorId) -> Result<String, CryptoError>;

    /// Verify `signature` over `data` against `validator`'s public key.
    ///
    /// Missing keys and malformed signatures yield `false`.
    fn verify(&self, data: &[u8], validator: ValidatorId, signature: &str) -> bool;
}

// =============================================================================
// FILE-BACKED STORE
// =============================================================================

/// Key pairs stored as hex text files in one directory.
pub struct FileKeyStore {
    dir: PathBuf,
    public_cache: RwLock<HashMap<ValidatorId, Ed25519PublicKey>>,
}

impl FileKeyStore {
    /// Use `dir` as the key directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            public_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Key directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `validator`'s private key file.
    pub fn private_key_path(&self, validator: ValidatorId) -> PathBuf {
        self.dir.join(format!("{}_private.key", validator.port()))
    }

    /// Path of `validator`'s public key file.
    pub fn public_key_path(&self, validator: ValidatorId) -> PathBuf {
        self.dir.join(format!("{}_public.key", validator.port()))
    }

    /// Generate and persist a fresh key pair for `validator`.
    ///
    /// Refuses to replace an existing private key.
    pub fn generate(&self, validator: ValidatorId) -> Result<Ed25519PublicKey, CryptoError> {
        fs::create_dir_all(&self.dir).map_err(|e| key_io(&self.dir, e))?;

        let keypair = Ed25519KeyPair::generate();
        let public = keypair.public_key();

        let private_path = self.private_key_path(validator);
        let mut file = create_private_file(&private_path).map_err(|e| key_io(&private_path, e))?;
        file.write_all(keypair.to_seed_hex().as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| key_io(&private_path, e))?;

        let public_path = self.public_key_path(validator);
        fs::write(&public_path, public.to_hex()).map_err(|e| key_io(&public_path, e))?;

        self.public_cache.write().insert(validator, public);
        debug!(%validator, path = %private_path.display(), "Generated validator key pair");
        Ok(public)
    }

    fn load_keypair(&self, validator: ValidatorId) -> Result<Ed25519KeyPair, CryptoError> {
        let path = self.private_key_path(validator);
        let text = fs::read_to_string(&path).map_err(|e| key_io(&path, e))?;
        Ed25519KeyPair::from_seed_hex(&text)
    }

    /// Load (and cache) `validator`'s public key.
    pub fn public_key(&self, validator: ValidatorId) -> Result<Ed25519PublicKey, CryptoError> {
        if let Some(key) = self.public_cache.read().get(&validator) {
            return Ok(*key);
        }
        let path = self.public_key_path(validator);
        let text = fs::read_to_string(&path).map_err(|e| key_io(&path, e))?;
        let key = Ed25519PublicKey::from_hex(&text)?;
        self.public_cache.write().insert(validator, key);
        Ok(key)
    }
}

impl AuthorityKeys for FileKeyStore {
    fn sign(&self, data: &[u8], validator: ValidatorId) -> Result<String, CryptoError> {
        let keypair = self.load_keypair(validator)?;
        Ok(keypair.sign(data).to_hex())
    }

    fn verify(&self, data: &[u8], validator: ValidatorId, signature: &str) -> bool {
        let key = match self.public_key(validator) {
            Ok(key) => key,
            Err(e) => {
                debug!(%validator, error = %e, "Public key unavailable");
                return false;
            }
        };
        verify_hex(&key, data, signature)
    }
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
}

fn key_io(path: &Path, source: std::io::Error) -> CryptoError {
    CryptoError::KeyIo {
        path: path.display().to_string(),
        source,
    }
}

fn verify_hex(key: &Ed25519PublicKey, data: &[u8], signature: &str) -> bool {
    Ed25519Signature::from_hex(signature)
        .and_then(|sig| key.verify(data, &sig))
        .is_ok()
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Deterministic in-memory key pairs.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<ValidatorId, Ed25519KeyPair>>,
}

impl InMemoryKeyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a key pair for each listed validator.
    pub fn with_validators(validators: &[ValidatorId]) -> Self {
        let store = Self::new();
        for validator in validators {
            store.add_validator(*validator);
        }
        store
    }

    /// Add the deterministic key pair of `validator`.
    pub fn add_validator(&self, validator: ValidatorId) {
        self.insert(validator, Ed25519KeyPair::from_seed(seed_for(validator)));
    }

    /// Register a key pair for `validator`.
    pub fn insert(&self, validator: ValidatorId, keypair: Ed25519KeyPair) {
        self.keys.write().insert(validator, keypair);
    }
}

fn seed_for(validator: ValidatorId) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..2].copy_from_slice(&validator.port().to_le_bytes());
    seed[2..].fill(0x5A);
    seed
}

impl AuthorityKeys for InMemoryKeyStore {
    fn sign(&self, data: &[u8], validator: ValidatorId) -> Result<String, CryptoError> {
        self.keys
            .read()
            .get(&validator)
            .map(|kp| kp.sign(data).to_hex())
            .ok_or(CryptoError::UnknownValidator(validator.port()))
    }

    fn verify(&self, data: &[u8], validator: ValidatorId, signature: &str) -> bool {
        match self.keys.read().get(&validator) {
            Some(kp) => verify_hex(&kp.public_key(), data, signature),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_sign_verify() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        store.generate(ValidatorId(8001)).unwrap();

        let sig = store.sign(b"abc", ValidatorId(8001)).unwrap();
        assert!(store.verify(b"abc", ValidatorId(8001), &sig));
        assert!(!store.verify(b"abd", ValidatorId(8001), &sig));

        // A second store reading the same files agrees.
        let reader = FileKeyStore::new(dir.path());
        assert!(reader.verify(b"abc", ValidatorId(8001), &sig));
    }

    #[test]
    fn test_file_store_missing_key() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        assert!(matches!(
            store.sign(b"abc", ValidatorId(9)),
            Err(CryptoError::KeyIo { .. })
        ));
        assert!(!store.verify(b"abc", ValidatorId(9), "00"));
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        store.generate(ValidatorId(8001)).unwrap();
        assert!(store.generate(ValidatorId(8001)).is_err());
    }

    #[test]
    fn test_wrong_validator_rejected() {
        let store = InMemoryKeyStore::with_validators(&[ValidatorId(1), ValidatorId(2)]);
        let sig = store.sign(b"fp", ValidatorId(1)).unwrap();
        assert!(store.verify(b"fp", ValidatorId(1), &sig));
        assert!(!store.verify(b"fp", ValidatorId(2), &sig));
        assert!(!store.verify(b"fp", ValidatorId(1), "not hex"));
    }

    #[test]
    fn test_in_memory_keys_are_deterministic() {
        let a = InMemoryKeyStore::with_validators(&[ValidatorId(8001)]);
        let b = InMemoryKeyStore::with_validators(&[ValidatorId(8001)]);
        let sig = a.sign(b"fp", ValidatorId(8001)).unwrap();
        assert!(b.verify(b"fp", ValidatorId(8001), &sig));
    }
}
