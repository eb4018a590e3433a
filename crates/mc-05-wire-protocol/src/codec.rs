//! Block text codec.
//!
//! `decode_block` is the exact inverse of `encode_block`. A decode either
//! yields a complete, field-checked [`Block`] or an error; no partially
//! populated block ever escapes.

use std::fmt::Write as _;
use std::str::FromStr;

use shared_types::{
    Block, Transaction, ValidatorId, FINGERPRINT_HEX_LEN, MAX_DIGEST_LEN, MAX_ID_LEN,
    MAX_POINTER_LEN, MAX_TRANSACTIONS,
};

use crate::errors::CodecError;

/// Field separator inside a record.
pub const FIELD_SEP: char = '|';

/// Record terminator.
pub const RECORD_SEP: char = '~';

/// Tag opening every transaction record.
pub const TX_TAG: &str = "TX";

/// Sentinel record closing an encoded block.
pub const END_BLOCK: &str = "END_BLOCK";

const HEADER_FIELDS: usize = 7;
const TX_FIELDS: usize = 6;

/// Widest decimal rendering of a `u64`/`i64`.
const MAX_NUMBER_LEN: usize = 20;

/// Upper bound on the length of an encoded block.
///
/// Each record contributes one separator per field (the last one being `~`).
pub const MAX_ENCODED_BLOCK_LEN: usize = (2 * MAX_NUMBER_LEN + 3 * MAX_DIGEST_LEN + 5 + 1 + HEADER_FIELDS)
    + MAX_TRANSACTIONS
        * (TX_TAG.len()
            + 2 * MAX_ID_LEN
            + FINGERPRINT_HEX_LEN
            + MAX_POINTER_LEN
            + MAX_NUMBER_LEN
            + TX_FIELDS)
    + END_BLOCK.len()
    + 1;

/// Encode `block` as a single-line text record set.
///
/// Fails if any field would collide with the reserved delimiters.
pub fn encode_block(block: &Block) -> Result<String, CodecError> {
    block.validate_fields()?;

    let mut out = String::with_capacity(256 + block.transactions.len() * 256);
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "{}|{}|{}|{}|{}|{}|{}~",
        block.index,
        block.timestamp,
        block.previous_hash,
        block.block_hash,
        block.validator,
        block.validator_signature,
        block.transactions.len()
    );
    for tx in &block.transactions {
        let _ = write!(
            out,
            "{TX_TAG}|{}|{}|{}|{}|{}~",
            tx.patient_id, tx.doctor_id, tx.data_hash, tx.data_pointer, tx.timestamp
        );
    }
    out.push_str(END_BLOCK);
    out.push(RECORD_SEP);
    Ok(out)
}

/// Decode the text produced by [`encode_block`].
pub fn decode_block(text: &str) -> Result<Block, CodecError> {
    let text = text.trim_end_matches(['\r', '\n']);
    if text.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut records = text.split(RECORD_SEP);
    let header = records.next().ok_or(CodecError::Empty)?;
    let fields: Vec<&str> = header.split(FIELD_SEP).collect();
    if fields.len() != HEADER_FIELDS {
        return Err(CodecError::HeaderFieldCount {
            expected: HEADER_FIELDS,
            found: fields.len(),
        });
    }

    let declared: usize = parse_number("tx_count", fields[6])?;
    if declared > MAX_TRANSACTIONS {
        return Err(CodecError::TooManyTransactions {
            declared,
            max: MAX_TRANSACTIONS,
        });
    }

    let mut block = Block::new(
        parse_number("index", fields[0])?,
        parse_number("timestamp", fields[1])?,
        fields[2],
        ValidatorId(parse_number("validator_port", fields[4])?),
    );
    block.block_hash = fields[3].to_string();
    block.validator_signature = fields[5].to_string();

    let mut transactions = Vec::with_capacity(declared);
    let mut terminated = false;
    for record in records.by_ref() {
        if record == END_BLOCK {
            terminated = true;
            break;
        }
        transactions.push(decode_transaction(record, transactions.len())?);
        if transactions.len() > declared {
            return Err(CodecError::TransactionCountMismatch {
                declared,
                found: transactions.len(),
            });
        }
    }
    if !terminated {
        return Err(CodecError::MissingTerminator);
    }
    if records.any(|r| !r.is_empty()) {
        return Err(CodecError::TrailingData);
    }
    if transactions.len() != declared {
        return Err(CodecError::TransactionCountMismatch {
            declared,
            found: transactions.len(),
        });
    }

    block.transactions = transactions;
    block.validate_fields()?;
    Ok(block)
}

fn decode_transaction(record: &str, position: usize) -> Result<Transaction, CodecError> {
    let fields: Vec<&str> = record.split(FIELD_SEP).collect();
    if fields[0] != TX_TAG {
        return Err(CodecError::UnexpectedRecord(record.to_string()));
    }
    if fields.len() != TX_FIELDS {
        return Err(CodecError::TransactionFieldCount {
            position,
            expected: TX_FIELDS,
            found: fields.len(),
        });
    }
    Ok(Transaction::new(
        fields[1],
        fields[2],
        fields[3],
        fields[4],
        parse_number("tx_timestamp", fields[5])?,
    ))
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, CodecError> {
    value.parse().map_err(|_| CodecError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::FieldError;

    fn sample_block(tx_count: usize) -> Block {
        let mut block = Block::new(4, 1_700_000_000, "ab".repeat(32), ValidatorId(8001));
        for i in 0..tx_count {
            block
                .add_transaction(Transaction::new(
                    format!("PAT-{i}"),
                    "DR-7",
                    format!("{i:064x}"),
                    format!("offchain/records/r{i}.enc"),
                    1_700_000_000 + i as i64,
                ))
                .unwrap();
        }
        block.seal();
        block.validator_signature = "cd".repeat(64);
        block
    }

    #[test]
    fn test_encoding_layout() {
        let h = "0a".repeat(32);
        let mut block = Block::new(0, 10, "0", ValidatorId(8001));
        block
            .add_transaction(Transaction::new("P", "D", h.clone(), "ptr", 11))
            .unwrap();
        block.block_hash = "bh".into();
        block.validator_signature = "sig".into();
        assert_eq!(
            encode_block(&block).unwrap(),
            format!("0|10|0|bh|8001|sig|1~TX|P|D|{h}|ptr|11~END_BLOCK~")
        );
    }

    #[test]
    fn test_roundtrip_empty_and_full() {
        for n in [0, MAX_TRANSACTIONS] {
            let block = sample_block(n);
            let decoded = decode_block(&encode_block(&block).unwrap()).unwrap();
            assert_eq!(decoded, block);
        }
    }

    #[test]
    fn test_encode_rejects_reserved_characters() {
        let mut block = sample_block(1);
        block.transactions[0].data_pointer = "a~b".into();
        assert!(matches!(
            encode_block(&block),
            Err(CodecError::Field(_))
        ));
    }

    #[test]
    fn test_decode_rejects_count_mismatch() {
        let text = encode_block(&sample_block(2)).unwrap().replacen("|2~", "|3~", 1);
        assert_eq!(
            decode_block(&text),
            Err(CodecError::TransactionCountMismatch {
                declared: 3,
                found: 2
            })
        );

        let text = encode_block(&sample_block(2)).unwrap().replacen("|2~", "|1~", 1);
        assert!(matches!(
            decode_block(&text),
            Err(CodecError::TransactionCountMismatch { declared: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_too_many_transactions() {
        let text = "1|0|p|h|8001|s|6~END_BLOCK~";
        assert_eq!(
            decode_block(text),
            Err(CodecError::TooManyTransactions {
                declared: 6,
                max: MAX_TRANSACTIONS
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        assert!(matches!(
            decode_block("1|2|3~END_BLOCK~"),
            Err(CodecError::HeaderFieldCount { found: 3, .. })
        ));
        assert!(matches!(
            decode_block("x|0|p|h|8001|s|0~END_BLOCK~"),
            Err(CodecError::InvalidNumber { field: "index", .. })
        ));
        assert_eq!(decode_block(""), Err(CodecError::Empty));
    }

    #[test]
    fn test_decode_requires_terminator() {
        let text = "1|0|p|h|8001|s|0~";
        assert_eq!(decode_block(text), Err(CodecError::MissingTerminator));
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let text = "1|0|p|h|8001|s|0~END_BLOCK~junk~";
        assert_eq!(decode_block(text), Err(CodecError::TrailingData));
    }

    #[test]
    fn test_decode_rejects_foreign_record() {
        let text = "1|0|p|h|8001|s|1~XX|a|b|c|d|1~END_BLOCK~";
        assert!(matches!(
            decode_block(text),
            Err(CodecError::UnexpectedRecord(_))
        ));
    }

    #[test]
    fn test_decode_enforces_field_limits() {
        let long_id = "P".repeat(40);
        let text = format!("1|0|p|h|8001|s|1~TX|{long_id}|D|h|ptr|1~END_BLOCK~");
        assert!(matches!(decode_block(&text), Err(CodecError::Field(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_data_hash() {
        let digest = "5e".repeat(32);
        let mut block = sample_block(1);
        block.transactions[0].data_hash = digest.clone();
        let good = encode_block(&block).unwrap();

        for bad in ["h".to_string(), digest.to_uppercase(), digest[..40].to_string()] {
            let text = good.replacen(&digest, &bad, 1);
            assert_eq!(
                decode_block(&text),
                Err(CodecError::Field(FieldError::NotAFingerprint { field: "data_hash" }))
            );
        }
    }

    fn field(max: usize) -> impl Strategy<Value = String> {
        proptest::string::string_regex(&format!("[A-Za-z0-9_./:-]{{0,{max}}}")).unwrap()
    }

    fn arb_transaction() -> impl Strategy<Value = Transaction> {
        (field(31), field(31), "[0-9a-f]{64}", field(127), any::<i64>())
            .prop_map(|(p, d, h, ptr, ts)| Transaction::new(p, d, h, ptr, ts))
    }

    fn arb_block() -> impl Strategy<Value = Block> {
        (
            any::<u64>(),
            any::<i64>(),
            "[0-9a-f]{64}|0",
            "[0-9a-f]{64}",
            any::<u16>(),
            "[0-9a-f]{0,128}",
            proptest::collection::vec(arb_transaction(), 0..=MAX_TRANSACTIONS),
        )
            .prop_map(|(index, ts, prev, hash, port, sig, txs)| {
                let mut block = Block::new(index, ts, prev, ValidatorId(port));
                block.block_hash = hash;
                block.validator_signature = sig;
                block.transactions = txs;
                block
            })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(block in arb_block()) {
            let text = encode_block(&block).unwrap();
            prop_assert!(!text.contains('\n'));
            prop_assert_eq!(decode_block(&text).unwrap(), block);
        }
    }
}
