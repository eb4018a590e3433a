//! # Genesis Module
//!
//! Opens a node's ledger and anchors it with a genesis block.
//!
//! The genesis block is deterministic apart from its signature:
//!
//! - Index: 0
//! - Previous hash: `"0"`
//! - Timestamp: fixed chain epoch
//! - One well-known `GENESIS`/`SYSTEM` record with pointer `genesis`
//!
//! Every failure here is fatal to startup.

use std::sync::Arc;

use mc_02_ledger_store::{FileBlockLog, LedgerApi, LedgerError, LedgerStore};
use shared_crypto::AuthorityKeys;
use shared_types::ValidatorId;
use thiserror::Error;
use tracing::{info, warn};

use crate::container::NodeConfig;

/// Ledger bootstrap errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to open ledger {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: LedgerError,
    },

    #[error("Failed to create genesis block: {0}")]
    Create(#[source] LedgerError),
}

/// Open `<data_dir>/blockchain_<port>.dat` and append genesis if it is empty.
///
/// With `create_genesis` disabled an empty ledger stays empty and is filled
/// from peers by chain sync.
pub fn bootstrap_ledger(
    config: &NodeConfig,
    validator: ValidatorId,
    keys: Arc<dyn AuthorityKeys>,
) -> Result<LedgerStore, GenesisError> {
    let path = config.ledger_path(validator.port());
    let open_err = |source| GenesisError::Open {
        path: path.display().to_string(),
        source,
    };

    let log = FileBlockLog::open(&path).map_err(open_err)?;
    let ledger = LedgerStore::open(log, keys).map_err(open_err)?;

    if config.storage.create_genesis {
        if let Some(genesis) = ledger
            .ensure_genesis(validator)
            .map_err(GenesisError::Create)?
        {
            info!(block_hash = %genesis.block_hash, "Genesis block written");
        }
    }

    // A damaged chain is reported but does not stop the node; VERIFY shows it.
    match ledger.verify_chain() {
        Ok(height) => info!(height, path = %path.display(), "Ledger ready"),
        Err(e) => warn!(error = %e, path = %path.display(), "Ledger failed verification"),
    }

    Ok(ledger)
}
