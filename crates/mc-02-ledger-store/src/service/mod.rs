//! # Ledger Store Service
//!
//! One store-wide lock guards the block log together with an in-memory mirror
//! of the chain. Appends go to the log first and reach the mirror only after
//! the write succeeded; lookups are served from the mirror. `verify_chain`
//! deliberately re-reads the log so on-disk tampering is visible.


use std::collections::HashSet;
use std::sync::Arc;

use mc_telemetry::{log_block_event, metrics, time_histogram};
use parking_lot::Mutex;
use shared_crypto::AuthorityKeys;
use shared_types::{Block, ValidatorId};
use tracing::{debug, info, warn};

use crate::adapters::InMemoryBlockLog;
use crate::domain::errors::{ChainFault, FaultReason, LedgerError, LedgerResult};
use crate::domain::genesis::build_genesis;
use crate::domain::record::LogRecord;
use crate::domain::rules::{check_successor, verify_blocks, verify_signature};
use crate::ports::inbound::LedgerApi;
use crate::ports::outbound::BlockLog;

struct Inner {
    log: Box<dyn BlockLog>,
    blocks: Vec<Block>,
    data_hashes: HashSet<String>,
}

impl Inner {
    fn push(&mut self, block: &Block) -> LedgerResult<()> {
        block.validate_fields()?;
        self.log.append(block)?;
        self.data_hashes
            .extend(block.transactions.iter().map(|tx| tx.data_hash.clone()));
        self.blocks.push(block.clone());

        metrics::BLOCKS_APPENDED.inc();
        metrics::CHAIN_HEIGHT.set(self.blocks.len() as f64);
        log_block_event!(
            info,
            "mc-02",
            "[mc-02] Block appended",
            block.index,
            block.block_hash,
            validator = %block.validator,
            tx_count = block.transaction_count()
        );
        Ok(())
    }

    fn check_next(&self, block: &Block, keys: &dyn AuthorityKeys) -> Result<(), ChainFault> {
        check_successor(block, self.blocks.last(), &self.data_hashes, keys)
    }
}

/// The Ledger Store.
pub struct LedgerStore {
    inner: Mutex<Inner>,
    keys: Arc<dyn AuthorityKeys>,
}

impl LedgerStore {
    /// Load the chain from `log`.
    ///
    /// A corrupt record is a load error; the chain is not verified here.
    pub fn open(log: impl BlockLog + 'static, keys: Arc<dyn AuthorityKeys>) -> LedgerResult<Self> {
        let location = log.location();
        let mut blocks = Vec::new();
        for record in log.read_all()? {
            match record {
                LogRecord::Block(block) => blocks.push(block),
                LogRecord::Corrupt { position } => {
                    warn!(position, location = %location, "[mc-02] Corrupt ledger record");
                    return Err(LedgerError::CorruptRecord { position });
                }
            }
        }
        let data_hashes = blocks
            .iter()
            .flat_map(|b| b.transactions.iter().map(|tx| tx.data_hash.clone()))
            .collect();

        info!(
            location = %location,
            height = blocks.len(),
            "[mc-02] Ledger opened"
        );
        metrics::CHAIN_HEIGHT.set(blocks.len() as f64);

        Ok(Self {
            inner: Mutex::new(Inner {
                log: Box::new(log),
                blocks,
                data_hashes,
            }),
            keys,
        })
    }

    /// Empty in-memory ledger.
    pub fn in_memory(keys: Arc<dyn AuthorityKeys>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                log: Box::new(InMemoryBlockLog::new()),
                blocks: Vec::new(),
                data_hashes: HashSet::new(),
            }),
            keys,
        }
    }

    /// Key store used for signing and verification.
    pub fn keys(&self) -> &Arc<dyn AuthorityKeys> {
        &self.keys
    }

    /// Build and sign the genesis block as `validator`, without appending it.
    pub fn create_genesis(&self, validator: ValidatorId) -> LedgerResult<Block> {
        build_genesis(validator, self.keys.as_ref())
    }

    /// Append a genesis block if the chain is empty.
    ///
    /// Returns the new genesis block, or `None` if the chain already had one.
    pub fn ensure_genesis(&self, validator: ValidatorId) -> LedgerResult<Option<Block>> {
        let mut inner = self.inner.lock();
        if !inner.blocks.is_empty() {
            return Ok(None);
        }
        let genesis = build_genesis(validator, self.keys.as_ref())?;
        inner.push(&genesis)?;
        info!(%validator, block_hash = %genesis.block_hash, "[mc-02] Genesis block created");
        Ok(Some(genesis))
    }

    /// Copy of the whole chain.
    pub fn blocks(&self) -> Vec<Block> {
        self.inner.lock().blocks.clone()
    }
}

impl LedgerApi for LedgerStore {
    fn height(&self) -> u64 {
        self.inner.lock().blocks.len() as u64
    }

    fn last_block(&self) -> Option<Block> {
        self.inner.lock().blocks.last().cloned()
    }

    fn block_by_index(&self, index: u64) -> Option<Block> {
        let inner = self.inner.lock();
        match usize::try_from(index).ok().and_then(|i| inner.blocks.get(i)) {
            Some(block) if block.index == index => Some(block.clone()),
            _ => inner.blocks.iter().find(|b| b.index == index).cloned(),
        }
    }

    fn transaction_hash_exists(&self, data_hash: &str) -> bool {
        self.inner.lock().data_hashes.contains(data_hash)
    }

    fn append(&self, block: &Block) -> LedgerResult<()> {
        self.inner.lock().push(block)
    }

    fn check_extension(&self, block: &Block) -> Result<(), ChainFault> {
        self.inner.lock().check_next(block, self.keys.as_ref())
    }

    fn try_extend(&self, block: &Block) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        inner.check_next(block, self.keys.as_ref())?;
        inner.push(block)
    }

    fn verify_chain(&self) -> LedgerResult<u64> {
        let _timer = time_histogram!(metrics::BLOCK_VERIFICATION_DURATION);
        let inner = self.inner.lock();
        let keys = self.keys.as_ref();

        let mut blocks = Vec::new();
        for record in inner.log.read_all()? {
            match record {
                LogRecord::Block(block) => blocks.push(block),
                LogRecord::Corrupt { position } => {
                    // An earlier fault takes precedence over the corrupt record.
                    verify_blocks(&blocks, keys)?;
                    return Err(ChainFault::new(position, FaultReason::CorruptRecord).into());
                }
            }
        }
        match verify_blocks(&blocks, keys) {
            Ok(height) => {
                debug!(height, "[mc-02] Chain verified");
                Ok(height)
            }
            Err(fault) => {
                warn!(index = fault.index, reason = %fault.reason, "[mc-02] Chain verification failed");
                Err(fault.into())
            }
        }
    }

    fn verify_block(&self, block: &Block) -> Result<(), ChainFault> {
        if !block.has_valid_fingerprint() {
            return Err(ChainFault::new(block.index, FaultReason::FingerprintMismatch));
        }
        if !verify_signature(block, self.keys.as_ref()) {
            return Err(ChainFault::new(block.index, FaultReason::InvalidSignature));
        }
        Ok(())
    }

    fn seal_and_sign(&self, block: &mut Block, validator: ValidatorId) -> LedgerResult<()> {
        block.validator = validator;
        block.seal();
        block.validator_signature = self.keys.sign(block.block_hash.as_bytes(), validator)?;
        Ok(())
    }
}
