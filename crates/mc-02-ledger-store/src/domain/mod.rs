//! # Domain Layer for the Ledger Store
//!
//! Pure chain rules and record framing. No locking and no file handles.

pub mod errors;
pub mod genesis;
pub mod record;
pub mod rules;
