/// Log level (can be overridden by RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Burst framing (ITU-R M.1371-4)
// ============================================================================

/// Training sequence length in bits
pub const TRAINING_BITS: usize = 24;

/// HDLC flag 0x7E as transmitted, one bit per element
pub const HDLC_FLAG_BITS: [u8; 8] = [0, 1, 1, 1, 1, 1, 1, 0];

/// Trailing buffer bits appended after the end flag
pub const BUFFER_BITS: usize = 24;

/// One AIS slot worth of payload
pub const MAX_PAYLOAD_BITS: usize = 1008;

/// Frame check sequence length in bits
pub const CRC_BITS: usize = 16;

/// Shortest frame emitted by the on-air preset; shorter frames are zero padded
pub const ON_AIR_MIN_FRAME_BITS: usize = 256;

/// Ones in a row after which a zero is stuffed
pub const STUFF_RUN: usize = 5;

// ============================================================================
// Channel / RF parameters
// ============================================================================

/// Channel A (87B) center frequency
pub const AIS_BASE_FREQUENCY_HZ: u64 = 161_975_000;

/// Distance between channel A and channel B
pub const AIS_CHANNEL_SPACING_HZ: u64 = 50_000;

pub const DEFAULT_SAMPLE_RATE: u32 = 8_000_000;

/// AIS GMSK symbol rate (baud)
pub const DEFAULT_BIT_RATE: u32 = 9600;

/// RF amplifier gain step when enabled
pub const AMP_GAIN_DB: u32 = 14;

pub const IF_GAIN_MIN_DB: i32 = 0;
pub const IF_GAIN_MAX_DB: i32 = 47;
pub const DEFAULT_IF_GAIN_DB: i32 = 10;

/// Fixed baseband gain applied by the RF sink
pub const BB_GAIN_DB: u32 = 16;

/// Gaussian filter bandwidth-time product for AIS
pub const GMSK_BT: f32 = 0.4;

/// Output scaling in front of the RF sink
pub const OUTPUT_SCALE: f32 = 0.9;

// ============================================================================
// Pipeline / ingest
// ============================================================================

/// Default ingest address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:1337";

/// WebSocket ingest address used by browser front ends
pub const DEFAULT_WS_LISTEN_ADDR: &str = "0.0.0.0:52002";

/// Budget for reading one whole TCP submission
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 3000;

/// WebSocket connections stay open between submissions; this closes abandoned ones
pub const DEFAULT_WS_IDLE_TIMEOUT_S: u64 = 300;

/// Write timeout for replies to submitters
pub const REPLY_TIMEOUT_MS: u64 = 1000;

/// Accept loop poll interval while idle
pub const ACCEPT_POLL_MS: u64 = 50;

/// Bytes handed to the sink per write; cancellation is checked in between
pub const STREAM_CHUNK_BYTES: usize = 32;
