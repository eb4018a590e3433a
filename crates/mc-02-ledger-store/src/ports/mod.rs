//! # Ports Layer
//!
//! - `inbound` - API this crate offers (`LedgerApi`)
//! - `outbound` - storage it requires (`BlockLog`)

pub mod inbound;
pub mod outbound;
