//! Protocol messages.
//!
//! Every inbound line goes through [`Message::parse`] exactly once; handlers
//! match on the resulting variant instead of testing string prefixes.

use std::fmt;

use shared_types::Block;

use crate::codec::{decode_block, encode_block, MAX_ENCODED_BLOCK_LEN};
use crate::errors::{CodecError, ParseError};

/// Upper bound on the length of any rendered message, without the newline.
pub const MAX_MESSAGE_LEN: usize = "PROPOSE_BLOCK:".len() + MAX_ENCODED_BLOCK_LEN;

/// A vote on an outstanding proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    Approve,
    Reject,
}

impl Vote {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Approve => "APPROVE",
            Vote::Reject => "REJECT",
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Vote::Approve => "approve",
            Vote::Reject => "reject",
        }
    }
}

/// Keyword of a message, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    GetHeight,
    ChainHeight,
    GetBlock,
    SyncBlock,
    ProposeBlock,
    BlockVote,
    CommitBlock,
}

impl MessageKind {
    /// Wire keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            MessageKind::GetHeight => "GET_HEIGHT",
            MessageKind::ChainHeight => "CHAIN_HEIGHT",
            MessageKind::GetBlock => "GET_BLOCK",
            MessageKind::SyncBlock => "SYNC_BLOCK",
            MessageKind::ProposeBlock => "PROPOSE_BLOCK",
            MessageKind::BlockVote => "BLOCK_VOTE",
            MessageKind::CommitBlock => "COMMIT_BLOCK",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "GET_HEIGHT" => MessageKind::GetHeight,
            "CHAIN_HEIGHT" => MessageKind::ChainHeight,
            "GET_BLOCK" => MessageKind::GetBlock,
            "SYNC_BLOCK" => MessageKind::SyncBlock,
            "PROPOSE_BLOCK" => MessageKind::ProposeBlock,
            "BLOCK_VOTE" => MessageKind::BlockVote,
            "COMMIT_BLOCK" => MessageKind::CommitBlock,
            _ => return None,
        })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One line of the peer protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Ask a peer for its chain height.
    GetHeight,
    /// Report the local chain height.
    ChainHeight(u64),
    /// Request the block at an index.
    GetBlock(u64),
    /// Backfill response to `GetBlock`.
    SyncBlock(Block),
    /// Candidate block awaiting votes.
    ProposeBlock(Block),
    /// Vote on the receiver's outstanding proposal.
    BlockVote(Vote),
    /// Block that reached majority at its proposer.
    CommitBlock(Block),
}

impl Message {
    /// Keyword of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::GetHeight => MessageKind::GetHeight,
            Message::ChainHeight(_) => MessageKind::ChainHeight,
            Message::GetBlock(_) => MessageKind::GetBlock,
            Message::SyncBlock(_) => MessageKind::SyncBlock,
            Message::ProposeBlock(_) => MessageKind::ProposeBlock,
            Message::BlockVote(_) => MessageKind::BlockVote,
            Message::CommitBlock(_) => MessageKind::CommitBlock,
        }
    }

    /// Parse one protocol line. Trailing `\r`/`\n` are ignored.
    pub fn parse(line: &str) -> Result<Message, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (keyword, payload) = line.split_once(':').unwrap_or((line, ""));
        let kind = MessageKind::from_keyword(keyword)
            .ok_or_else(|| ParseError::UnknownKind(truncate(keyword)))?;

        let block = |payload: &str| {
            decode_block(payload).map_err(|source| ParseError::MalformedBlock {
                kind: kind.keyword(),
                source,
            })
        };

        Ok(match kind {
            MessageKind::GetHeight => Message::GetHeight,
            MessageKind::ChainHeight => Message::ChainHeight(parse_u64(kind, payload)?),
            MessageKind::GetBlock => Message::GetBlock(parse_u64(kind, payload)?),
            MessageKind::SyncBlock => Message::SyncBlock(block(payload)?),
            MessageKind::ProposeBlock => Message::ProposeBlock(block(payload)?),
            MessageKind::CommitBlock => Message::CommitBlock(block(payload)?),
            MessageKind::BlockVote => Message::BlockVote(match payload.trim() {
                "APPROVE" => Vote::Approve,
                "REJECT" => Vote::Reject,
                other => return Err(ParseError::InvalidVote(truncate(other))),
            }),
        })
    }

    /// Render as a protocol line, without the trailing newline.
    pub fn render(&self) -> Result<String, CodecError> {
        let kind = self.kind().keyword();
        Ok(match self {
            Message::GetHeight => kind.to_string(),
            Message::ChainHeight(n) | Message::GetBlock(n) => format!("{kind}:{n}"),
            Message::SyncBlock(b) | Message::ProposeBlock(b) | Message::CommitBlock(b) => {
                format!("{kind}:{}", encode_block(b)?)
            }
            Message::BlockVote(vote) => format!("{kind}:{}", vote.as_str()),
        })
    }
}

fn parse_u64(kind: MessageKind, payload: &str) -> Result<u64, ParseError> {
    payload
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            kind: kind.keyword(),
            value: truncate(payload),
        })
}

fn truncate(text: &str) -> String {
    text.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Transaction, ValidatorId};

    fn block() -> Block {
        let mut block = Block::new(2, 100, "prev", ValidatorId(8002));
        block
            .add_transaction(Transaction::new("P", "D", "ab".repeat(32), "ptr", 101))
            .unwrap();
        block.seal();
        block.validator_signature = "sig".into();
        block
    }

    #[test]
    fn test_parse_simple_messages() {
        assert_eq!(Message::parse("GET_HEIGHT\n"), Ok(Message::GetHeight));
        assert_eq!(Message::parse("GET_HEIGHT:"), Ok(Message::GetHeight));
        assert_eq!(
            Message::parse("CHAIN_HEIGHT:5\r\n"),
            Ok(Message::ChainHeight(5))
        );
        assert_eq!(Message::parse("GET_BLOCK:0"), Ok(Message::GetBlock(0)));
        assert_eq!(
            Message::parse("BLOCK_VOTE:APPROVE"),
            Ok(Message::BlockVote(Vote::Approve))
        );
        assert_eq!(
            Message::parse("BLOCK_VOTE:REJECT"),
            Ok(Message::BlockVote(Vote::Reject))
        );
    }

    #[test]
    fn test_block_messages_roundtrip() {
        for msg in [
            Message::SyncBlock(block()),
            Message::ProposeBlock(block()),
            Message::CommitBlock(block()),
        ] {
            let line = msg.render().unwrap();
            assert_eq!(Message::parse(&line), Ok(msg));
        }
    }

    #[test]
    fn test_render_spelling() {
        assert_eq!(Message::GetHeight.render().unwrap(), "GET_HEIGHT");
        assert_eq!(Message::ChainHeight(7).render().unwrap(), "CHAIN_HEIGHT:7");
        assert_eq!(
            Message::BlockVote(Vote::Reject).render().unwrap(),
            "BLOCK_VOTE:REJECT"
        );
    }

    #[test]
    fn test_unknown_and_malformed() {
        assert!(matches!(
            Message::parse("HELLO:world"),
            Err(ParseError::UnknownKind(_))
        ));
        assert!(matches!(
            Message::parse("CHAIN_HEIGHT:-1"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Message::parse("BLOCK_VOTE:MAYBE"),
            Err(ParseError::InvalidVote(_))
        ));
        assert!(matches!(
            Message::parse("PROPOSE_BLOCK:garbage"),
            Err(ParseError::MalformedBlock {
                kind: "PROPOSE_BLOCK",
                ..
            })
        ));
    }

    #[test]
    fn test_data_pointer_may_contain_colon() {
        let mut b = block();
        b.transactions[0].data_pointer = "C:/records/r1".into();
        b.seal();
        let line = Message::CommitBlock(b.clone()).render().unwrap();
        assert_eq!(Message::parse(&line), Ok(Message::CommitBlock(b)));
    }

    #[test]
    fn test_widest_block_fits_message_bound() {
        use shared_types::{
            FINGERPRINT_HEX_LEN, MAX_DIGEST_LEN, MAX_ID_LEN, MAX_POINTER_LEN, MAX_TRANSACTIONS,
        };

        let digest = "f".repeat(MAX_DIGEST_LEN);
        let mut b = Block::new(u64::MAX, i64::MIN, digest.clone(), ValidatorId(u16::MAX));
        for _ in 0..MAX_TRANSACTIONS {
            b.add_transaction(Transaction::new(
                "p".repeat(MAX_ID_LEN),
                "d".repeat(MAX_ID_LEN),
                "f".repeat(FINGERPRINT_HEX_LEN),
                "r".repeat(MAX_POINTER_LEN),
                i64::MIN,
            ))
            .unwrap();
        }
        b.block_hash = digest.clone();
        b.validator_signature = digest;

        let line = Message::ProposeBlock(b).render().unwrap();
        assert_eq!(line.len(), MAX_MESSAGE_LEN);
    }
}
