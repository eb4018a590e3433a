//! # Wire Protocol Subsystem (mc-05)
//!
//! Text encoding of blocks and the line-oriented peer message vocabulary.
//!
//! ## Block Encoding
//!
//! ```text
//! index|timestamp|previous_hash|block_hash|validator_port|signature|tx_count~
//! TX|patient_id|doctor_id|data_hash|data_pointer|timestamp~      (x tx_count)
//! END_BLOCK~
//! ```
//!
//! Records are concatenated without newlines so an encoded block fits in a
//! single protocol line. `|` and `~` are reserved and may not appear in any
//! field value.
//!
//! ## Messages
//!
//! | Line | Variant |
//! |------|---------|
//! | `GET_HEIGHT` | [`Message::GetHeight`] |
//! | `CHAIN_HEIGHT:<n>` | [`Message::ChainHeight`] |
//! | `GET_BLOCK:<i>` | [`Message::GetBlock`] |
//! | `SYNC_BLOCK:<encoded>` | [`Message::SyncBlock`] |
//! | `PROPOSE_BLOCK:<encoded>` | [`Message::ProposeBlock`] |
//! | `BLOCK_VOTE:APPROVE\|REJECT` | [`Message::BlockVote`] |
//! | `COMMIT_BLOCK:<encoded>` | [`Message::CommitBlock`] |

pub mod codec;
pub mod errors;
pub mod message;

pub use codec::{decode_block, encode_block, END_BLOCK, MAX_ENCODED_BLOCK_LEN, TX_TAG};
pub use errors::{CodecError, ParseError};
pub use message::{Message, MessageKind, Vote, MAX_MESSAGE_LEN};
