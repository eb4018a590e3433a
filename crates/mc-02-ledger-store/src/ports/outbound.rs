//! # Outbound Ports (Driven Ports)
//!
//! Persistence required by the Ledger Store.
//!
//! Production: `FileBlockLog`
//! Testing: `InMemoryBlockLog`

use shared_types::Block;

use crate::domain::errors::LedgerResult;

pub use crate::domain::record::LogRecord;

/// Append-only sequence of block records.
pub trait BlockLog: Send {
    /// Append one record; durable when this returns `Ok`.
    fn append(&mut self, block: &Block) -> LedgerResult<()>;

    /// Read every record in order. A missing log reads as empty.
    fn read_all(&self) -> LedgerResult<Vec<LogRecord>>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
