//! # Adapters
//!
//! Block log implementations.

mod file;
mod memory;

pub use file::FileBlockLog;
pub use memory::InMemoryBlockLog;
