//! Domain layer for chain sync.

mod errors;
mod state;

pub use errors::*;
pub use state::*;
