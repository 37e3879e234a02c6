// Burst format:
// [Training] [Start flag] [stuff(Payload || FCS)] [End flag] [Buffer] [Pad to min length]
// packed MSB first, final byte zero padded; bit_len counts real bits only.

use std::ops::Range;

use super::crc::{bits_to_bytes, bytes_to_bits};

/// Bit positions of each frame section inside a burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    pub training: Range<usize>,
    pub start_flag: Range<usize>,
    /// Stuffed payload + FCS
    pub data: Range<usize>,
    pub end_flag: Range<usize>,
    /// Buffer bits plus any minimum-length padding
    pub trailer: Range<usize>,
}

impl FrameLayout {
    pub fn new(training: usize, data: usize, trailer: usize) -> Self {
        let start_flag = training..training + 8;
        let data = start_flag.end..start_flag.end + data;
        let end_flag = data.end..data.end + 8;
        let trailer = end_flag.end..end_flag.end + trailer;
        Self {
            training: 0..training,
            start_flag,
            data,
            end_flag,
            trailer,
        }
    }

    pub fn total_bits(&self) -> usize {
        self.trailer.end
    }
}

/// Framed, byte-packed burst ready for the modulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstFrame {
    bytes: Vec<u8>,
    bit_len: usize,
    layout: FrameLayout,
}

impl BurstFrame {
    pub(crate) fn from_bits(bits: &[u8], layout: FrameLayout) -> Self {
        debug_assert_eq!(bits.len(), layout.total_bits());
        Self {
            bytes: bits_to_bytes(bits),
            bit_len: bits.len(),
            layout,
        }
    }

    /// Packed burst, MSB first.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of real bits; anything past this in the last byte is padding.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn pad_bits(&self) -> usize {
        self.bytes.len() * 8 - self.bit_len
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Unpack back into one bit per element, dropping the pad bits.
    pub fn bits(&self) -> Vec<u8> {
        let mut bits = bytes_to_bits(&self.bytes);
        bits.truncate(self.bit_len);
        bits
    }
}
