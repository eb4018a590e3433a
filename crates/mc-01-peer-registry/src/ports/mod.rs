//! Ports for the peer registry.

pub mod inbound;
pub mod outbound;
