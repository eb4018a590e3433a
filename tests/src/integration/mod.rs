//! Multi-node integration tests.

mod consensus;
mod scenarios;
