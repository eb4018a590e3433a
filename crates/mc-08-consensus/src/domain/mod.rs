//! Domain layer for consensus.

mod errors;
mod majority;
mod state;
mod validation;

pub use errors::*;
pub use majority::*;
pub use state::*;
pub use validation::*;
