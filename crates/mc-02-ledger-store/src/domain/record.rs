//! Ledger record framing.
//!
//! ```text
//! [len: u32 LE][crc32: u32 LE][bincode(Block): len bytes]
//! ```
//!
//! A complete record with a bad checksum is reported as corrupt and scanning
//! continues with the next record. A trailing partial record (torn write) ends
//! the scan.

use shared_types::Block;
use tracing::warn;

use super::errors::{LedgerError, LedgerResult};

/// Bytes before the payload.
pub const RECORD_HEADER_LEN: usize = 8;

/// Upper bound on one encoded block.
pub const MAX_RECORD_LEN: usize = 1 << 20;

/// One record read back from a block log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A block whose record checked out.
    Block(Block),
    /// A record at this position that failed checksum or decoding.
    Corrupt { position: u64 },
}

/// Result of scanning a log's bytes.
#[derive(Debug, Default)]
pub struct RecordScan {
    pub records: Vec<LogRecord>,
    /// Offset just past the last complete record.
    pub valid_len: u64,
    /// True when bytes after `valid_len` form a partial record.
    pub torn_tail: bool,
}

/// Frame `block` as one record.
pub fn encode_record(block: &Block) -> LedgerResult<Vec<u8>> {
    let payload =
        bincode::serialize(block).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    if payload.len() > MAX_RECORD_LEN {
        return Err(LedgerError::Serialization(format!(
            "record of {} bytes exceeds {MAX_RECORD_LEN}",
            payload.len()
        )));
    }
    let mut out = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Split `bytes` into records.
pub fn scan_records(bytes: &[u8]) -> RecordScan {
    let mut scan = RecordScan::default();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let position = scan.records.len() as u64;
        if bytes.len() - cursor < RECORD_HEADER_LEN {
            scan.torn_tail = true;
            break;
        }
        let len = read_u32(bytes, cursor) as usize;
        let crc = read_u32(bytes, cursor + 4);
        if len > MAX_RECORD_LEN {
            // Length prefix is garbage; nothing after it can be framed.
            warn!(position, len, "[mc-02] Record length out of range");
            scan.records.push(LogRecord::Corrupt { position });
            break;
        }
        let start = cursor + RECORD_HEADER_LEN;
        if bytes.len() - start < len {
            scan.torn_tail = true;
            break;
        }
        let payload = &bytes[start..start + len];
        let record = if crc32fast::hash(payload) != crc {
            LogRecord::Corrupt { position }
        } else {
            match bincode::deserialize::<Block>(payload) {
                Ok(block) => LogRecord::Block(block),
                Err(_) => LogRecord::Corrupt { position },
            }
        };
        scan.records.push(record);
        cursor = start + len;
        scan.valid_len = cursor as u64;
    }
    scan
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}
