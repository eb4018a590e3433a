//! # Control Shell
//!
//! Line-oriented operator commands read from stdin.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `ADD <file>` | Propose a block pointing at an off-chain record |
//! | `HEIGHT` | Local chain height |
//! | `LAST` | Print the newest block |
//! | `PRINT <index>` | Print one block |
//! | `VERIFY` | Verify the stored chain from genesis |
//! | `PEERS` | Connected peers |
//! | `SYNC` | Ask peers for their height, clearing a stalled sync |
//! | `HASH <file>` | Content fingerprint of a record |
//! | `CHECKDUP <file>` | Whether a record is already on the chain |
//! | `CHECKSIG <index>` | Recheck fingerprint and signature of one block |
//! | `VALIDATE <file>` | Compare a record against its on-chain fingerprint |
//! | `STATS [PROMETHEUS]` | Counters since startup, optionally in Prometheus text format |
//! | `HELP` | This table |
//!
//! Any other line is broadcast to peers verbatim.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mc_01_peer_registry::{PeerRegistry, PeerTransport};
use mc_02_ledger_store::{LedgerApi, LedgerError, LedgerStore};
use mc_08_consensus::{ConsensusApi, ConsensusError, ProposalOutcome};
use mc_13_chain_sync::ChainSyncApi;
use mc_telemetry::{encode_metrics, register_metrics, MetricsSnapshot, TelemetryError};
use shared_crypto::content_fingerprint;
use shared_types::{Block, FieldError, Transaction, ValidatorId};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::container::{ConcreteChainSync, ConcreteConsensus};
use crate::node::NodeRuntime;

/// Placeholder identities recorded for blocks added from the console.
pub const CONSOLE_PATIENT_ID: &str = "PATIENT_FROM_FILE";
pub const CONSOLE_DOCTOR_ID: &str = "DOCTOR_FROM_FILE";

const HELP: &str = "\
Commands:
  ADD <file>        propose a block for an off-chain record
  HEIGHT            local chain height
  LAST              print the newest block
  PRINT <index>     print one block
  VERIFY            verify the chain from genesis
  PEERS             connected peers
  SYNC              ask peers for their height
  HASH <file>       content fingerprint of a record
  CHECKDUP <file>   is the record already on the chain
  CHECKSIG <index>  recheck fingerprint and signature of a block
  VALIDATE <file>   has the record changed since it was added
  STATS [PROMETHEUS] counters since startup
  HELP              this text
Anything else is sent to peers as a raw protocol line.";

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Height,
    Last,
    Print(u64),
    Verify,
    Peers,
    Sync,
    Hash(String),
    CheckDup(String),
    CheckSig(u64),
    Validate(String),
    Stats { prometheus: bool },
    Help,
    /// Unrecognized input, forwarded to peers.
    Raw(String),
}

impl Command {
    /// Parse one console line. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, ShellError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (keyword, arg) = match line.split_once(char::is_whitespace) {
            Some((keyword, arg)) => (keyword, arg.trim()),
            None => (line, ""),
        };

        let file = |usage: &'static str| {
            if arg.is_empty() {
                Err(ShellError::Usage(usage))
            } else {
                Ok(arg.to_string())
            }
        };
        let index = |usage: &'static str| arg.parse::<u64>().map_err(|_| ShellError::Usage(usage));

        let command = match keyword {
            "ADD" => Command::Add(file("ADD <file>")?),
            "HEIGHT" => Command::Height,
            "LAST" => Command::Last,
            "PRINT" => Command::Print(index("PRINT <index>")?),
            "VERIFY" => Command::Verify,
            "PEERS" => Command::Peers,
            "SYNC" => Command::Sync,
            "HASH" => Command::Hash(file("HASH <file>")?),
            "CHECKDUP" => Command::CheckDup(file("CHECKDUP <file>")?),
            "CHECKSIG" => Command::CheckSig(index("CHECKSIG <index>")?),
            "VALIDATE" => Command::Validate(file("VALIDATE <file>")?),
            "STATS" => match arg {
                "" => Command::Stats { prometheus: false },
                "PROMETHEUS" => Command::Stats { prometheus: true },
                _ => return Err(ShellError::Usage("STATS [PROMETHEUS]")),
            },
            "HELP" => Command::Help,
            _ => Command::Raw(line.to_string()),
        };
        Ok(Some(command))
    }
}

/// Errors reported back to the operator.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    EmptyFile(String),

    #[error("Record already on chain (data hash {0})")]
    Duplicate(String),

    #[error("Ledger has no genesis block yet")]
    NoGenesis,

    #[error("No block at index {0}")]
    NoSuchBlock(u64),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Metrics(#[from] TelemetryError),
}

/// Executes operator commands against a running node.
pub struct ControlShell {
    validator: ValidatorId,
    offchain_dir: PathBuf,
    ledger: Arc<LedgerStore>,
    registry: Arc<PeerRegistry>,
    consensus: Arc<ConcreteConsensus>,
    sync: Arc<ConcreteChainSync>,
}

impl ControlShell {
    pub fn new(node: &NodeRuntime) -> Self {
        Self {
            validator: node.validator(),
            offchain_dir: node.config().records.offchain_dir.clone(),
            ledger: Arc::clone(node.ledger()),
            registry: Arc::clone(node.registry()),
            consensus: Arc::clone(node.consensus()),
            sync: Arc::clone(node.sync()),
        }
    }

    /// Run one console line and return the text to show the operator.
    pub fn execute(&self, line: &str) -> String {
        let result = Command::parse(line).and_then(|command| match command {
            Some(command) => self.run(command),
            None => Ok(String::new()),
        });
        result.unwrap_or_else(|e| format!("Error: {e}"))
    }

    pub fn run(&self, command: Command) -> Result<String, ShellError> {
        debug!(?command, "Control command");
        match command {
            Command::Add(file) => self.add(&file),
            Command::Height => Ok(format!("Height: {}", self.ledger.height())),
            Command::Last => self
                .ledger
                .last_block()
                .map(|b| describe_block(&b))
                .ok_or(ShellError::NoGenesis),
            Command::Print(index) => self
                .ledger
                .block_by_index(index)
                .map(|b| describe_block(&b))
                .ok_or(ShellError::NoSuchBlock(index)),
            Command::Verify => Ok(match self.ledger.verify_chain() {
                Ok(height) => format!("Chain valid ({height} blocks)"),
                Err(e) => format!("Chain INVALID: {e}"),
            }),
            Command::Peers => Ok(self.peers()),
            Command::Sync => {
                let asked = self.sync.retrigger();
                Ok(format!("Requested chain height from {asked} peers"))
            }
            Command::Hash(file) => {
                let (_, hash) = self.fingerprint_file(&file)?;
                Ok(format!("{file}: {hash}"))
            }
            Command::CheckDup(file) => {
                let (_, hash) = self.fingerprint_file(&file)?;
                Ok(if self.ledger.transaction_hash_exists(&hash) {
                    format!("{file} is already on the chain")
                } else {
                    format!("{file} is not on the chain")
                })
            }
            Command::CheckSig(index) => {
                let block = self
                    .ledger
                    .block_by_index(index)
                    .ok_or(ShellError::NoSuchBlock(index))?;
                Ok(match self.ledger.verify_block(&block) {
                    Ok(()) => format!(
                        "Block {index}: fingerprint and signature valid (validator {})",
                        block.validator
                    ),
                    Err(fault) => format!("Block {index}: {}", fault.reason),
                })
            }
            Command::Validate(file) => self.validate(&file),
            Command::Stats { prometheus: false } => Ok(format!(
                "{}\nvalidator            {}",
                MetricsSnapshot::capture(),
                self.validator
            )),
            Command::Stats { prometheus: true } => {
                register_metrics()?;
                Ok(encode_metrics()?)
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Raw(line) => {
                let sent = self.registry.broadcast(&line);
                Ok(format!("Sent to {sent} peers"))
            }
        }
    }

    fn add(&self, file: &str) -> Result<String, ShellError> {
        let (pointer, data_hash) = self.fingerprint_file(file)?;
        if self.ledger.transaction_hash_exists(&data_hash) {
            return Err(ShellError::Duplicate(data_hash));
        }
        let last = self.ledger.last_block().ok_or(ShellError::NoGenesis)?;

        let now = unix_now();
        let mut block = Block::new(self.ledger.height(), now, last.block_hash, self.validator);
        block.add_transaction(Transaction::new(
            CONSOLE_PATIENT_ID,
            CONSOLE_DOCTOR_ID,
            data_hash,
            pointer,
            now,
        ))?;
        block.validate_fields()?;
        self.ledger.seal_and_sign(&mut block, self.validator)?;

        info!(index = block.index, file, "Proposing block from console");
        Ok(match self.consensus.propose(block)? {
            ProposalOutcome::Committed { index, block_hash } => {
                format!("Block {index} committed ({block_hash})")
            }
            ProposalOutcome::Pending { approvals, needed } => {
                format!("Proposal broadcast, {approvals}/{needed} approvals")
            }
            ProposalOutcome::Abandoned { index } => {
                format!("Proposal for block {index} abandoned")
            }
            ProposalOutcome::Ignored => "Proposal ignored".to_string(),
        })
    }

    fn validate(&self, file: &str) -> Result<String, ShellError> {
        let (pointer, hash) = self.fingerprint_file(file)?;
        let stored = self.ledger.blocks().into_iter().find_map(|block| {
            block
                .transactions
                .into_iter()
                .find(|tx| tx.data_pointer == pointer)
                .map(|tx| (block.index, tx.data_hash))
        });
        Ok(match stored {
            None => format!("{file}: no record on the chain"),
            Some((index, stored)) if stored == hash => {
                format!("{file}: not altered (block {index})")
            }
            Some((index, stored)) => {
                format!("{file}: ALTERED (block {index} recorded {stored}, file is now {hash})")
            }
        })
    }

    fn peers(&self) -> String {
        let peers = self.registry.peers();
        if peers.is_empty() {
            return "No connected peers".to_string();
        }
        let mut out = format!("{} connected peers:", peers.len());
        for peer in peers {
            let _ = write!(
                out,
                "\n  {} port {} ({}, {:?}) last seen {}s ago",
                peer.id,
                peer.port,
                peer.remote_addr,
                peer.direction,
                peer.last_seen.elapsed().as_secs()
            );
        }
        out
    }

    /// Read `<offchain_dir>/<file>` and return its pointer and fingerprint.
    fn fingerprint_file(&self, file: &str) -> Result<(String, String), ShellError> {
        let path = self.offchain_dir.join(file);
        let pointer = path.display().to_string();
        let bytes = fs::read(&path).map_err(|source| ShellError::Read {
            path: pointer.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(ShellError::EmptyFile(pointer));
        }
        Ok((pointer, content_fingerprint(&bytes)))
    }
}

/// Read commands from stdin until EOF.
pub async fn run_stdin(shell: ControlShell) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type HELP for commands.");
    while let Some(line) = lines.next_line().await? {
        let output = shell.execute(&line);
        if !output.is_empty() {
            println!("{output}");
        }
    }
    Ok(())
}

/// Multi-line description of a block for the console.
pub fn describe_block(block: &Block) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Block {}", block.index);
    let _ = writeln!(out, "  timestamp      {}", block.timestamp);
    let _ = writeln!(out, "  previous_hash  {}", block.previous_hash);
    let _ = writeln!(out, "  block_hash     {}", block.block_hash);
    let _ = writeln!(out, "  validator      {}", block.validator);
    let _ = write!(out, "  transactions   {}", block.transaction_count());
    for (i, tx) in block.transactions.iter().enumerate() {
        let _ = write!(
            out,
            "\n  [{i}] patient {} doctor {} data_hash {} pointer {} at {}",
            tx.patient_id, tx.doctor_id, tx.data_hash, tx.data_pointer, tx.timestamp
        );
    }
    out
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("HEIGHT").unwrap(), Some(Command::Height));
        assert_eq!(
            Command::parse("ADD scan.enc").unwrap(),
            Some(Command::Add("scan.enc".into()))
        );
        assert_eq!(Command::parse("PRINT 3").unwrap(), Some(Command::Print(3)));
        assert_eq!(
            Command::parse("CHECKSIG  0 ").unwrap(),
            Some(Command::CheckSig(0))
        );
        assert_eq!(
            Command::parse("STATS").unwrap(),
            Some(Command::Stats { prometheus: false })
        );
        assert_eq!(
            Command::parse("STATS PROMETHEUS").unwrap(),
            Some(Command::Stats { prometheus: true })
        );
    }

    #[test]
    fn test_missing_arguments() {
        assert!(matches!(
            Command::parse("ADD"),
            Err(ShellError::Usage("ADD <file>"))
        ));
        assert!(matches!(
            Command::parse("PRINT x"),
            Err(ShellError::Usage("PRINT <index>"))
        ));
        assert!(matches!(
            Command::parse("STATS json"),
            Err(ShellError::Usage("STATS [PROMETHEUS]"))
        ));
    }

    #[test]
    fn test_unknown_input_is_raw() {
        assert_eq!(
            Command::parse("GET_HEIGHT").unwrap(),
            Some(Command::Raw("GET_HEIGHT".into()))
        );
        assert_eq!(
            Command::parse("height").unwrap(),
            Some(Command::Raw("height".into()))
        );
    }

    #[test]
    fn test_describe_block() {
        let mut block = Block::new(1, 10, "prev", ValidatorId(8001));
        block
            .add_transaction(Transaction::new("P", "D", "h", "ptr", 11))
            .unwrap();
        let text = describe_block(&block);
        assert!(text.starts_with("Block 1"));
        assert!(text.contains("pointer ptr"));
    }
}
