// CRC-16/CCITT frame check sequence, HDLC convention
// Polynomial: x^16 + x^12 + x^5 + 1 (0x1021), processed reflected (0x8408)
// Initial register 0xFFFF, result complemented

const CRC16_POLY_REFLECTED: u16 = 0x8408;
const CRC16_INIT: u16 = 0xFFFF;

/// Register value left behind when a frame's own FCS is run through the CRC.
pub const CRC16_GOOD_RESIDUE: u16 = 0xF0B8;

fn crc16_register(bits: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &bit in bits {
        let feedback = (crc ^ u16::from(bit & 1)) & 1;
        crc >>= 1;
        if feedback != 0 {
            crc ^= CRC16_POLY_REFLECTED;
        }
    }

    crc
}

/// Calculate the FCS over bits in transmission order.
///
/// Feeding the bits of an octet LSB first gives the same value as the usual
/// byte-wise CRC-16/X.25, e.g. `"123456789"` yields `0x906E`.
pub fn crc16_ccitt(bits: &[u8]) -> u16 {
    crc16_register(bits) ^ 0xFFFF
}

/// FCS as transmitted: bit 0 first.
pub fn crc16_bits(crc: u16) -> [u8; 16] {
    let mut bits = [0u8; 16];
    for (i, bit) in bits
        .iter_mut()
        .enumerate()
    {
        *bit = ((crc >> i) & 1) as u8;
    }
    bits
}

/// Verify a received `data || fcs` bit sequence.
pub fn check_residue(bits_with_fcs: &[u8]) -> bool {
    bits_with_fcs.len() >= 16 && crc16_register(bits_with_fcs) == CRC16_GOOD_RESIDUE
}

/// Convert byte to bit array (MSB first)
pub fn byte_to_bits(byte: u8) -> [u8; 8] {
    let mut bits = [0u8; 8];
    for i in 0..8 {
        bits[i] = (byte >> (7 - i)) & 1;
    }
    bits
}

/// Convert up to eight bits to a byte (MSB first, missing bits are zero)
pub fn bits_to_byte(bits: &[u8]) -> u8 {
    let mut byte = 0u8;
    for (i, &bit) in bits
        .iter()
        .enumerate()
        .take(8)
    {
        if bit != 0 {
            byte |= 1 << (7 - i);
        }
    }
    byte
}

/// Convert bytes to bit vector
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        bits.extend_from_slice(&byte_to_bits(byte));
    }
    bits
}

/// Pack bits into bytes; the final byte is zero padded
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(bits_to_byte)
        .collect()
}
