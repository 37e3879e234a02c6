//! Error taxonomy
//!
//! Only [`ConfigError`] and [`HardwareError`] are fatal to the process. Everything
//! else is contained to the job or connection that caused it.

use std::io;

use thiserror::Error;

/// Invalid startup parameter or framing constant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid channel '{0}': expected A or B")]
    InvalidChannel(String),

    #[error("IF gain {0} dB out of range [0, 47]")]
    IfGainOutOfRange(i32),

    #[error("bit rate must be positive")]
    ZeroBitRate,

    #[error(
        "sample rate {sample_rate} Hz gives less than one sample per symbol at {bit_rate} Bd"
    )]
    SamplesPerSymbol { sample_rate: u32, bit_rate: u32 },

    #[error("invalid framing: {0}")]
    Framing(String),
}

/// Why a payload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadFault {
    #[error("payload is empty")]
    Empty,

    #[error("non-binary character {found:?} at position {position}")]
    InvalidChar { position: usize, found: char },

    #[error("payload is {len} bits, maximum is {max}")]
    TooLong { len: usize, max: usize },
}

/// Burst encoder failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadFault),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure of the RF transmit path.
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("failed to open transmit sink {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("transmit sink I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("transmit sink used out of sequence: {0}")]
    Sequence(&'static str),
}

/// Accept or read failure on a single connection.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("socket setup failed: {0}")]
    Socket(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("reply failed: {0}")]
    Write(#[source] io::Error),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("connection closed before newline terminator")]
    Incomplete,

    #[error("submission exceeds {limit} bytes")]
    Oversized { limit: usize },
}

/// Job queue refused a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("queue full ({capacity} jobs pending)")]
    Busy { capacity: usize },

    #[error("pipeline is shutting down")]
    Closed,
}
