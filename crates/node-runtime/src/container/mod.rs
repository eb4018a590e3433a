//! # Node Container
//!
//! Configuration and the concrete subsystem types the runtime wires together.

pub mod config;
pub mod subsystems;

pub use config::{parse_peer, ConfigError, NodeConfig};
pub use subsystems::{ConcreteChainSync, ConcreteConsensus, NodeContainer};
