// Line coding applied around the HDLC frame: the training sequence used for
// receiver clock recovery, and NRZI (0 -> transition, 1 -> hold level).

/// Alternating training pattern starting with `lead`, e.g. 0101... or 1010...
pub fn training_sequence(len: usize, lead: u8) -> Vec<u8> {
    let lead = lead & 1;
    (0..len)
        .map(|i| lead ^ (i % 2) as u8)
        .collect()
}

/// NRZ -> NRZI, initial line level 0
pub fn nrzi_encode(bits: &[u8]) -> Vec<u8> {
    let mut level = 0u8;
    bits.iter()
        .map(|&bit| {
            if bit == 0 {
                level ^= 1;
            }
            level
        })
        .collect()
}

/// NRZI -> NRZ, initial line level 0
pub fn nrzi_decode(levels: &[u8]) -> Vec<u8> {
    let mut prev = 0u8;
    levels
        .iter()
        .map(|&level| {
            let bit = u8::from(level == prev);
            prev = level;
            bit
        })
        .collect()
}
