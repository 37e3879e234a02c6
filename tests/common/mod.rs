#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ais_burst_tx::error::HardwareError;
use ais_burst_tx::phy::{BurstEncoder, FramingConfig};
use ais_burst_tx::transmission::BurstSink;

/// Everything a sink was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Open,
    Begin { bit_len: usize, byte_len: usize },
    Chunk(Vec<u8>),
    End,
    Abort,
    Release,
}

/// In-memory sink that logs calls and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    /// Fail the n-th `write_chunk` call (0 based)
    fail_chunk: Option<usize>,
    /// Sleep on every chunk to keep a burst on air for a while
    chunk_delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at_chunk(n: usize) -> Self {
        Self {
            fail_chunk: Some(n),
            ..Self::default()
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Bytes of every completed burst, one entry per burst.
    pub fn bursts(&self) -> Vec<Vec<u8>> {
        let mut bursts = Vec::new();
        let mut current = None;
        for call in self.calls() {
            match call {
                SinkCall::Begin { .. } => current = Some(Vec::new()),
                SinkCall::Chunk(bytes) => {
                    if let Some(buf) = current.as_mut() {
                        buf.extend_from_slice(&bytes);
                    }
                }
                SinkCall::End => bursts.extend(current.take()),
                SinkCall::Abort => current = None,
                _ => {}
            }
        }
        bursts
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn chunks_written(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, SinkCall::Chunk(_)))
            .count()
    }
}

impl BurstSink for RecordingSink {
    fn open(&mut self) -> Result<(), HardwareError> {
        self.record(SinkCall::Open);
        Ok(())
    }

    fn begin_burst(&mut self, bit_len: usize, byte_len: usize) -> Result<(), HardwareError> {
        self.record(SinkCall::Begin { bit_len, byte_len });
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), HardwareError> {
        if self.fail_chunk == Some(self.chunks_written()) {
            return Err(HardwareError::Io(std::io::Error::other("device unplugged")));
        }
        if let Some(delay) = self.chunk_delay {
            std::thread::sleep(delay);
        }
        self.record(SinkCall::Chunk(chunk.to_vec()));
        Ok(())
    }

    fn end_burst(&mut self) -> Result<(), HardwareError> {
        self.record(SinkCall::End);
        Ok(())
    }

    fn abort_burst(&mut self) -> Result<(), HardwareError> {
        self.record(SinkCall::Abort);
        Ok(())
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        self.record(SinkCall::Release);
        Ok(())
    }
}

pub fn plain_encoder() -> BurstEncoder {
    BurstEncoder::new(FramingConfig::default()).unwrap()
}

/// ASCII bit string from one-bit-per-element values.
pub fn bit_string(bits: &[u8]) -> String {
    bits.iter()
        .map(|&b| if b == 1 { '1' } else { '0' })
        .collect()
}
