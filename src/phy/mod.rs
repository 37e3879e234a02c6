// Physical layer: AIS burst framing (ITU-R M.1371-4)
// training sequence, HDLC flags, bit stuffing, CRC-16 FCS, byte packing

pub mod crc;
pub mod encoder;
pub mod frame;
pub mod line_coding;
pub mod stuffing;

pub use encoder::{BurstEncoder, FramingConfig, encode, parse_payload};
pub use frame::{BurstFrame, FrameLayout};
