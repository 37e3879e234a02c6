//! Boundary to the external modulation / RF stage
//!
//! The pipeline worker is the only caller; a sink never sees two bursts at once.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, info};

use crate::error::HardwareError;

/// Exclusive transmit resource.
pub trait BurstSink: Send {
    /// Acquire the resource. Called once before the first burst.
    fn open(&mut self) -> Result<(), HardwareError>;

    /// Announce a burst of `bit_len` real bits packed into `byte_len` bytes.
    fn begin_burst(&mut self, bit_len: usize, byte_len: usize) -> Result<(), HardwareError>;

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), HardwareError>;

    fn end_burst(&mut self) -> Result<(), HardwareError>;

    /// Drop the burst in progress without emitting it.
    fn abort_burst(&mut self) -> Result<(), HardwareError>;

    /// Release the resource. Called once on the way out.
    fn release(&mut self) -> Result<(), HardwareError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

impl FromStr for SinkTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => SinkTarget::Stdout,
            path => SinkTarget::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Stdout => write!(f, "stdout"),
            SinkTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

struct PendingBurst {
    bit_len: usize,
    byte_len: usize,
    bytes: Vec<u8>,
}

/// Writes bursts as length-tagged records for an external modulator:
/// `[u32 BE bit_len][u32 BE byte_len][bytes]`.
///
/// A record is written only once the whole burst has arrived, so a reader
/// never sees a torn burst.
pub struct StreamSink {
    target: SinkTarget,
    writer: Option<Box<dyn Write + Send>>,
    pending: Option<PendingBurst>,
    bursts: u64,
}

impl StreamSink {
    pub fn new(target: SinkTarget) -> Self {
        Self {
            target,
            writer: None,
            pending: None,
            bursts: 0,
        }
    }

    /// Wrap an already open writer.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            target: SinkTarget::Stdout,
            writer: Some(writer),
            pending: None,
            bursts: 0,
        }
    }

    pub fn bursts_written(&self) -> u64 {
        self.bursts
    }

    fn writer(&mut self) -> Result<&mut Box<dyn Write + Send>, HardwareError> {
        self.writer
            .as_mut()
            .ok_or(HardwareError::Sequence("sink is not open"))
    }
}

impl BurstSink for StreamSink {
    fn open(&mut self) -> Result<(), HardwareError> {
        if self.writer.is_some() {
            return Ok(());
        }
        let writer: Box<dyn Write + Send> = match &self.target {
            SinkTarget::Stdout => Box::new(io::stdout()),
            SinkTarget::File(path) => {
                let file = File::create(path).map_err(|source| HardwareError::Open {
                    target: path.display().to_string(),
                    source,
                })?;
                Box::new(BufWriter::new(file))
            }
        };
        info!("Transmit sink opened: {}", self.target);
        self.writer = Some(writer);
        Ok(())
    }

    fn begin_burst(&mut self, bit_len: usize, byte_len: usize) -> Result<(), HardwareError> {
        if self.pending.is_some() {
            return Err(HardwareError::Sequence("burst already in progress"));
        }
        self.writer()?;
        self.pending = Some(PendingBurst {
            bit_len,
            byte_len,
            bytes: Vec::with_capacity(byte_len),
        });
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), HardwareError> {
        let pending = self
            .pending
            .as_mut()
            .ok_or(HardwareError::Sequence("no burst in progress"))?;
        pending
            .bytes
            .extend_from_slice(chunk);
        Ok(())
    }

    fn end_burst(&mut self) -> Result<(), HardwareError> {
        let pending = self
            .pending
            .take()
            .ok_or(HardwareError::Sequence("no burst in progress"))?;
        if pending.bytes.len() != pending.byte_len {
            return Err(HardwareError::Sequence("burst length does not match announcement"));
        }

        let writer = self.writer()?;
        writer.write_u32::<BigEndian>(pending.bit_len as u32)?;
        writer.write_u32::<BigEndian>(pending.byte_len as u32)?;
        writer.write_all(&pending.bytes)?;
        writer.flush()?;

        self.bursts += 1;
        debug!(
            "Burst record written: {} bits, {} bytes",
            pending.bit_len, pending.byte_len
        );
        Ok(())
    }

    fn abort_burst(&mut self) -> Result<(), HardwareError> {
        if let Some(pending) = self.pending.take() {
            debug!(
                "Burst dropped after {} of {} bytes",
                pending.bytes.len(),
                pending.byte_len
            );
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        self.pending = None;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!("Transmit sink released after {} bursts", self.bursts);
        }
        Ok(())
    }
}

/// Read one record written by [`StreamSink`]; `None` at a clean end of stream.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<Option<(usize, Vec<u8>)>> {
    let bit_len = match reader.read_u32::<BigEndian>() {
        Ok(n) => n as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    let byte_len = reader.read_u32::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; byte_len];
    reader.read_exact(&mut bytes)?;
    Ok(Some((bit_len, bytes)))
}
