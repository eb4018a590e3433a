use shared_types::Block;

use crate::domain::errors::LedgerResult;
use crate::domain::record::LogRecord;
use crate::ports::outbound::BlockLog;

/// In-memory block log for tests and throwaway nodes.
#[derive(Default)]
pub struct InMemoryBlockLog {
    records: Vec<LogRecord>,
}

impl InMemoryBlockLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log pre-seeded with `blocks`, bypassing every chain rule.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            records: blocks.into_iter().map(LogRecord::Block).collect(),
        }
    }
}

impl BlockLog for InMemoryBlockLog {
    fn append(&mut self, block: &Block) -> LedgerResult<()> {
        self.records.push(LogRecord::Block(block.clone()));
        Ok(())
    }

    fn read_all(&self) -> LedgerResult<Vec<LogRecord>> {
        Ok(self.records.clone())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
