//! Ports for chain sync.

pub mod inbound;
pub mod outbound;
