//! # Peer Registry & Transport (mc-01)
//!
//! Bounded table of connected peers over plain TCP, carrying newline-terminated
//! text messages.
//!
//! ## Architecture Role
//!
//! ```text
//!            accept / connect
//! [TCP] ──────────────────────→ [PeerRegistry] ── one reader + one writer task per peer
//!                                     │
//!              each complete line     ↓
//!                              [LineHandler] (protocol dispatcher)
//! ```
//!
//! ## Concurrency
//!
//! - One lock guards the peer table; it is held only for the table operation
//!   itself (insert, remove, count, enqueue to every peer).
//! - Every peer has its own writer task fed by an unbounded queue, so a
//!   broadcast never waits on a slow or dead socket.
//! - Lines from one peer are handled sequentially, in arrival order.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - peer table, line framing, errors, config
//! - `ports/` - `PeerTransport` (inbound), `LineHandler` (outbound)
//! - `service/` - `PeerRegistry` with tokio networking

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    Direction, FrameOutcome, PeerId, PeerInfo, PeerTable, TransportConfig, TransportError,
    TransportResult,
};
pub use ports::inbound::PeerTransport;
pub use ports::outbound::LineHandler;
pub use service::PeerRegistry;
