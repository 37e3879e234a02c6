// HDLC bit stuffing: a 0 is inserted after every run of five 1s so the flag
// pattern 01111110 can never appear between the flags.

use crate::utils::consts::STUFF_RUN;

/// Insert a zero after every five consecutive ones.
pub fn bit_stuff(bits: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(bits.len() + bits.len() / STUFF_RUN);
    let mut ones = 0;

    for &bit in bits {
        output.push(bit);
        if bit != 0 {
            ones += 1;
            if ones == STUFF_RUN {
                output.push(0);
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }

    output
}

/// Remove stuffed zeros.
///
/// Returns `None` if a run of five ones is followed by another one (flag or
/// abort pattern inside the data region).
pub fn destuff(bits: &[u8]) -> Option<Vec<u8>> {
    let mut output = Vec::with_capacity(bits.len());
    let mut ones = 0;
    let mut iter = bits.iter();

    while let Some(&bit) = iter.next() {
        output.push(bit);
        if bit != 0 {
            ones += 1;
            if ones == STUFF_RUN {
                match iter.next() {
                    Some(0) => {}
                    Some(_) => return None,
                    // trailing run of five ones: nothing left to strip
                    None => break,
                }
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }

    Some(output)
}
