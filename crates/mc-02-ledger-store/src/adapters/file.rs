use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use shared_types::Block;
use tracing::{info, warn};

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::record::{encode_record, scan_records, LogRecord};
use crate::ports::outbound::BlockLog;

/// Append-only ledger file, one framed record per block.
///
/// Opened in append mode for every write and read sequentially for scans.
pub struct FileBlockLog {
    path: PathBuf,
}

impl FileBlockLog {
    /// Open the log at `path`, dropping a torn trailing record if present.
    ///
    /// A missing file is an empty log; it is created on first append.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("[mc-02] 📁 No ledger file at {}", path.display());
                return Ok(Self { path });
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        let scan = scan_records(&bytes);
        if scan.torn_tail {
            warn!(
                path = %path.display(),
                dropped = bytes.len() as u64 - scan.valid_len,
                "[mc-02] Truncating torn record at end of ledger"
            );
            let file = OpenOptions::new()
                .write(true)
                .open(&path)
                .map_err(|e| io_error(&path, e))?;
            file.set_len(scan.valid_len)
                .and_then(|_| file.sync_all())
                .map_err(|e| io_error(&path, e))?;
        }
        info!(
            "[mc-02] 💾 Found ledger file {} ({} records)",
            path.display(),
            scan.records.len()
        );
        Ok(Self { path })
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockLog for FileBlockLog {
    fn append(&mut self, block: &Block) -> LedgerResult<()> {
        let record = encode_record(block)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(&self.path, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_error(&self.path, e))?;
        file.write_all(&record)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| io_error(&self.path, e))
    }

    fn read_all(&self) -> LedgerResult<Vec<LogRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        let scan = scan_records(&bytes);
        if scan.torn_tail {
            warn!(path = %self.path.display(), "[mc-02] Ignoring torn record at end of ledger");
        }
        Ok(scan.records)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Transaction, ValidatorId};
    use tempfile::tempdir;

    fn block(index: u64) -> Block {
        let mut b = Block::new(index, 1, "p", ValidatorId(1));
        b.add_transaction(Transaction::new("P", "D", format!("h{index}"), "ptr", 2))
            .unwrap();
        b.seal();
        b
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let log = FileBlockLog::open(dir.path().join("none.dat")).unwrap();
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("blockchain_8001.dat");
        let mut log = FileBlockLog::open(&path).unwrap();
        log.append(&block(0)).unwrap();
        log.append(&block(1)).unwrap();

        let reopened = FileBlockLog::open(&path).unwrap();
        assert_eq!(
            reopened.read_all().unwrap(),
            vec![LogRecord::Block(block(0)), LogRecord::Block(block(1))]
        );
    }

    #[test]
    fn test_open_truncates_torn_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        let mut log = FileBlockLog::open(&path).unwrap();
        log.append(&block(0)).unwrap();
        let good_len = fs::metadata(&path).unwrap().len();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[9, 0, 0]).unwrap();
        drop(file);

        let mut log = FileBlockLog::open(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);
        log.append(&block(1)).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 2);
    }
}
