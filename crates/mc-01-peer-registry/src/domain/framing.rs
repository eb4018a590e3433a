//! Newline framing with a bounded line length.
//!
//! A line longer than the limit is consumed up to its newline and reported as
//! [`FrameOutcome::Oversized`]; the connection stays usable. A trailing partial
//! line at end of stream is dropped.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Result of reading one frame.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A complete line, without its terminator or a trailing `\r`.
    Line(String),
    /// A line exceeded the limit and was discarded.
    Oversized,
    /// The line was not valid UTF-8 and was discarded.
    NotUtf8,
    /// The stream ended.
    Eof,
}

/// Read the next newline-terminated line from `reader`.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> io::Result<FrameOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut discarding = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(FrameOutcome::Eof);
        }

        match available.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                if !discarding {
                    buf.extend_from_slice(&available[..pos]);
                }
                reader.consume(pos + 1);
                if discarding || buf.len() > max_len {
                    return Ok(FrameOutcome::Oversized);
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                return Ok(match String::from_utf8(buf) {
                    Ok(line) => FrameOutcome::Line(line),
                    Err(_) => FrameOutcome::NotUtf8,
                });
            }
            None => {
                let consumed = available.len();
                if !discarding {
                    buf.extend_from_slice(available);
                    if buf.len() > max_len {
                        discarding = true;
                        buf = Vec::new();
                    }
                }
                reader.consume(consumed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reads_lines_in_order() {
        let mut reader: &[u8] = b"GET_HEIGHT\nCHAIN_HEIGHT:4\r\n";
        assert_eq!(
            read_frame(&mut reader, 64).await.unwrap(),
            FrameOutcome::Line("GET_HEIGHT".into())
        );
        assert_eq!(
            read_frame(&mut reader, 64).await.unwrap(),
            FrameOutcome::Line("CHAIN_HEIGHT:4".into())
        );
        assert_eq!(read_frame(&mut reader, 64).await.unwrap(), FrameOutcome::Eof);
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\nGET_BLOCK:2\n");
        // A tiny buffer forces the long line to span several fills.
        let mut reader = BufReader::with_capacity(8, input.as_slice());

        assert_eq!(read_frame(&mut reader, 32).await.unwrap(), FrameOutcome::Oversized);
        assert_eq!(
            read_frame(&mut reader, 32).await.unwrap(),
            FrameOutcome::Line("GET_BLOCK:2".into())
        );
    }

    #[tokio::test]
    async fn test_partial_line_at_eof_is_dropped() {
        let mut reader: &[u8] = b"GET_HEIGHT\nPROPOSE_BLO";
        assert_eq!(
            read_frame(&mut reader, 64).await.unwrap(),
            FrameOutcome::Line("GET_HEIGHT".into())
        );
        assert_eq!(read_frame(&mut reader, 64).await.unwrap(), FrameOutcome::Eof);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_reported() {
        let mut reader: &[u8] = b"\xff\xfe\nGET_HEIGHT\n";
        assert_eq!(read_frame(&mut reader, 64).await.unwrap(), FrameOutcome::NotUtf8);
        assert_eq!(
            read_frame(&mut reader, 64).await.unwrap(),
            FrameOutcome::Line("GET_HEIGHT".into())
        );
    }

    #[tokio::test]
    async fn test_empty_line_is_a_line() {
        let mut reader: &[u8] = b"\n";
        assert_eq!(
            read_frame(&mut reader, 64).await.unwrap(),
            FrameOutcome::Line(String::new())
        );
    }
}
