//! # Domain Layer for the Peer Registry
//!
//! - **peer**: `PeerId`, `PeerInfo`, the bounded `PeerTable`
//! - **framing**: newline framing with a maximum line length
//! - **config**: `TransportConfig`
//! - **errors**: `TransportError`

mod config;
mod errors;
mod framing;
mod peer;

pub use config::*;
pub use errors::*;
pub use framing::*;
pub use peer::*;
