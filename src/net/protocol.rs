// Ingest wire protocol
//
// Client -> server: one payload per connection, ASCII '0'/'1' terminated by
// '\n' (a trailing '\r' is ignored). EOF before the newline is an error, never
// a payload.
//
// Server -> client: JSON lines, e.g.
//   {"status":"queued","job":3}
//   {"status":"done","job":3,"bits":256}

use std::io::{self, BufRead, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::transmission::{JobId, JobOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Queued { job: JobId },
    Done { job: JobId, bits: usize },
    Failed { job: JobId, reason: String },
    /// Still queued when the pipeline shut down
    Discarded { job: JobId },
    Busy,
    Rejected { reason: String },
}

impl Reply {
    pub fn from_outcome(job: JobId, outcome: Option<JobOutcome>) -> Self {
        match outcome {
            Some(JobOutcome::Done { bits }) => Reply::Done { job, bits },
            Some(JobOutcome::Failed { reason }) => Reply::Failed { job, reason },
            None => Reply::Discarded { job },
        }
    }
}

/// Largest submission accepted for a given payload limit, terminator included.
pub fn submission_limit(max_payload_bits: usize) -> usize {
    max_payload_bits + 2
}

/// Read one newline-terminated submission of at most `limit` bytes.
pub fn read_submission<R: BufRead>(reader: &mut R, limit: usize) -> Result<String, NetworkError> {
    let mut line = Vec::with_capacity(limit.min(1024));
    reader
        .take(limit as u64)
        .read_until(b'\n', &mut line)
        .map_err(NetworkError::Read)?;

    if line.last() != Some(&b'\n') {
        return Err(if line.len() >= limit {
            NetworkError::Oversized { limit }
        } else {
            NetworkError::Incomplete
        });
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    // bad bytes become U+FFFD and are reported by the encoder's charset check
    Ok(String::from_utf8_lossy(&line).into_owned())
}

pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, reply)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_line_terminated() {
        let mut input = &b"0101\n"[..];
        assert_eq!(read_submission(&mut input, 16).unwrap(), "0101");

        let mut input = &b"0101\r\ntrailing"[..];
        assert_eq!(read_submission(&mut input, 16).unwrap(), "0101");
    }

    #[test]
    fn test_empty_line_is_read_as_empty() {
        let mut input = &b"\n"[..];
        assert_eq!(read_submission(&mut input, 16).unwrap(), "");
    }

    #[test]
    fn test_eof_without_newline_is_incomplete() {
        let mut input = &b"0101"[..];
        assert!(matches!(
            read_submission(&mut input, 16),
            Err(NetworkError::Incomplete)
        ));
    }

    #[test]
    fn test_oversized_submission() {
        let mut input = &b"0101010101\n"[..];
        assert!(matches!(
            read_submission(&mut input, 4),
            Err(NetworkError::Oversized { limit: 4 })
        ));
    }

    #[test]
    fn test_reply_json() {
        let mut out = Vec::new();
        write_reply(&mut out, &Reply::Queued { job: 3 }).unwrap();
        write_reply(&mut out, &Reply::Busy).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"status\":\"queued\",\"job\":3}\n{\"status\":\"busy\"}\n"
        );

        let reply: Reply =
            serde_json::from_str(r#"{"status":"failed","job":9,"reason":"x"}"#).unwrap();
        assert_eq!(
            reply,
            Reply::Failed {
                job: 9,
                reason: "x".to_string()
            }
        );
    }

    #[test]
    fn test_reply_from_outcome() {
        assert_eq!(
            Reply::from_outcome(4, Some(JobOutcome::Done { bits: 81 })),
            Reply::Done { job: 4, bits: 81 }
        );
        assert_eq!(Reply::from_outcome(4, None), Reply::Discarded { job: 4 });
    }
}
