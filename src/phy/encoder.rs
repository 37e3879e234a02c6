use serde::Serialize;
use tracing::{debug, info};

use super::crc::{crc16_bits, crc16_ccitt};
use super::frame::{BurstFrame, FrameLayout};
use super::line_coding::{nrzi_encode, training_sequence};
use super::stuffing::bit_stuff;
use crate::error::{ConfigError, EncodeError, PayloadFault};
use crate::utils::consts::*;

/// Framing constants for one burst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FramingConfig {
    /// Length of the alternating training sequence
    pub training_bits: usize,
    /// First bit of the training sequence
    pub training_lead: u8,
    /// Zero bits after the end flag
    pub buffer_bits: usize,
    pub max_payload_bits: usize,
    /// Zero pad the payload to whole octets before the FCS
    pub pad_to_octet: bool,
    /// Send each payload octet LSB first
    pub lsb_first: bool,
    /// NRZI line coding over the whole burst
    pub nrzi: bool,
    /// Zero pad short bursts up to this length
    pub min_frame_bits: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            training_bits: TRAINING_BITS,
            training_lead: 0,
            buffer_bits: BUFFER_BITS,
            max_payload_bits: MAX_PAYLOAD_BITS,
            pad_to_octet: false,
            lsb_first: false,
            nrzi: false,
            min_frame_bits: 0,
        }
    }
}

impl FramingConfig {
    /// Burst as it goes on air: octet aligned, LSB-first octets, NRZI coded,
    /// at least 256 bits long, training sequence 1010...
    pub fn on_air() -> Self {
        Self {
            training_lead: 1,
            pad_to_octet: true,
            lsb_first: true,
            nrzi: true,
            min_frame_bits: ON_AIR_MIN_FRAME_BITS,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.training_bits == 0 {
            return Err(ConfigError::Framing(
                "training sequence must not be empty".to_string(),
            ));
        }
        if self.training_lead > 1 {
            return Err(ConfigError::Framing(format!(
                "training lead bit must be 0 or 1, got {}",
                self.training_lead
            )));
        }
        if self.max_payload_bits == 0 {
            return Err(ConfigError::Framing(
                "maximum payload length must be positive".to_string(),
            ));
        }
        if self.lsb_first && !self.pad_to_octet {
            return Err(ConfigError::Framing(
                "LSB-first octets require octet padding".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse an ASCII bit string, one bit per element.
pub fn parse_payload(text: &str, max_bits: usize) -> Result<Vec<u8>, PayloadFault> {
    if text.is_empty() {
        return Err(PayloadFault::Empty);
    }

    let bits = text
        .chars()
        .enumerate()
        .map(|(position, c)| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            found => Err(PayloadFault::InvalidChar { position, found }),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if bits.len() > max_bits {
        return Err(PayloadFault::TooLong {
            len: bits.len(),
            max: max_bits,
        });
    }

    Ok(bits)
}

/// Frame a payload with the given constants.
///
/// Pure: identical inputs always give byte-identical bursts.
pub fn encode(payload: &str, config: &FramingConfig) -> Result<BurstFrame, EncodeError> {
    config.validate()?;
    Ok(frame_bits(parse_payload(payload, config.max_payload_bits)?, config))
}

fn frame_bits(mut data: Vec<u8>, config: &FramingConfig) -> BurstFrame {
    let payload_bits = data.len();

    if config.pad_to_octet {
        let rem = data.len() % 8;
        if rem != 0 {
            data.resize(data.len() + 8 - rem, 0);
        }
    }
    if config.lsb_first {
        for octet in data.chunks_exact_mut(8) {
            octet.reverse();
        }
    }

    let fcs = crc16_ccitt(&data);
    data.extend_from_slice(&crc16_bits(fcs));
    let stuffed = bit_stuff(&data);

    let framed = config.training_bits + 8 + stuffed.len() + 8 + config.buffer_bits;
    let trailer = config.buffer_bits + config.min_frame_bits.saturating_sub(framed);
    let layout = FrameLayout::new(config.training_bits, stuffed.len(), trailer);

    let mut bits = Vec::with_capacity(layout.total_bits());
    bits.extend(training_sequence(config.training_bits, config.training_lead));
    bits.extend_from_slice(&HDLC_FLAG_BITS);
    bits.extend_from_slice(&stuffed);
    bits.extend_from_slice(&HDLC_FLAG_BITS);
    bits.resize(layout.total_bits(), 0);

    if config.nrzi {
        bits = nrzi_encode(&bits);
    }

    debug!(
        "Framed burst: payload={} bits, fcs={:#06x}, stuffed={} bits, total={} bits",
        payload_bits,
        fcs,
        stuffed.len(),
        bits.len()
    );

    BurstFrame::from_bits(&bits, layout)
}

/// Burst encoder bound to a validated framing configuration.
#[derive(Debug, Clone)]
pub struct BurstEncoder {
    config: FramingConfig,
}

impl BurstEncoder {
    pub fn new(config: FramingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!("BurstEncoder initialized:");
        info!(
            "  - training: {} bits (lead {})",
            config.training_bits, config.training_lead
        );
        info!("  - buffer: {} bits", config.buffer_bits);
        info!("  - max payload: {} bits", config.max_payload_bits);
        info!(
            "  - octet padding: {}, LSB first: {}, NRZI: {}, min frame: {} bits",
            config.pad_to_octet, config.lsb_first, config.nrzi, config.min_frame_bits
        );

        Ok(Self { config })
    }

    pub fn encode(&self, payload: &str) -> Result<BurstFrame, EncodeError> {
        let bits = parse_payload(payload, self.config.max_payload_bits)?;
        Ok(frame_bits(bits, &self.config))
    }

    pub fn config(&self) -> &FramingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::crc::check_residue;
    use crate::phy::line_coding::nrzi_decode;
    use crate::phy::stuffing::destuff;

    #[test]
    fn test_plain_frame_exact_bits() {
        let frame = encode("1", &FramingConfig::default()).unwrap();
        let bits = frame.bits();
        let layout = frame.layout().clone();

        // "1" has FCS 0x8000, sent bit 0 first; no stuffing needed
        let mut expected = training_sequence(24, 0);
        expected.extend_from_slice(&HDLC_FLAG_BITS);
        expected.push(1);
        expected.extend_from_slice(&crc16_bits(0x8000));
        expected.extend_from_slice(&HDLC_FLAG_BITS);
        expected.extend(vec![0; 24]);

        assert_eq!(layout.data.len(), 17);
        assert_eq!(bits, expected);
        assert_eq!(frame.bit_len(), 24 + 8 + 17 + 8 + 24);
        assert_eq!(frame.bytes().len(), 11);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        let config = FramingConfig::default();
        assert_eq!(
            encode("", &config),
            Err(EncodeError::InvalidPayload(PayloadFault::Empty))
        );
        assert_eq!(
            encode("01x1", &config),
            Err(EncodeError::InvalidPayload(PayloadFault::InvalidChar {
                position: 2,
                found: 'x'
            }))
        );
        let long = "1".repeat(MAX_PAYLOAD_BITS + 1);
        assert!(matches!(
            encode(&long, &config),
            Err(EncodeError::InvalidPayload(PayloadFault::TooLong { .. }))
        ));
        assert!(encode(&"1".repeat(MAX_PAYLOAD_BITS), &config).is_ok());
    }

    #[test]
    fn test_rejects_bad_framing() {
        let config = FramingConfig {
            training_bits: 0,
            ..FramingConfig::default()
        };
        assert!(matches!(
            encode("0101", &config),
            Err(EncodeError::Config(ConfigError::Framing(_)))
        ));

        let config = FramingConfig {
            pad_to_octet: false,
            ..FramingConfig::on_air()
        };
        assert!(BurstEncoder::new(config).is_err());
    }

    #[test]
    fn test_on_air_frame_decodes() {
        let payload = "000001000101011101011000";
        let frame = encode(payload, &FramingConfig::on_air()).unwrap();
        assert_eq!(frame.bit_len(), ON_AIR_MIN_FRAME_BITS);

        let nrz = nrzi_decode(&frame.bits());
        let layout = frame.layout();
        assert_eq!(&nrz[..4], &[1, 0, 1, 0]);
        assert_eq!(&nrz[layout.start_flag.clone()], &HDLC_FLAG_BITS);
        assert_eq!(&nrz[layout.end_flag.clone()], &HDLC_FLAG_BITS);

        let data = destuff(&nrz[layout.data.clone()]).unwrap();
        assert!(check_residue(&data));

        // first octet 00000100 goes out LSB first
        assert_eq!(&data[..8], &[0, 0, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_on_air_pads_to_octet() {
        let frame = encode("101", &FramingConfig::on_air()).unwrap();
        let nrz = nrzi_decode(&frame.bits());
        let data = destuff(&nrz[frame.layout().data.clone()]).unwrap();
        assert_eq!(data.len(), 8 + 16);
        assert_eq!(&data[..8], &[0, 0, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_long_frames_are_not_truncated_to_minimum() {
        let payload = "0110".repeat(42);
        let frame = encode(&payload, &FramingConfig::on_air()).unwrap();
        assert!(frame.bit_len() > ON_AIR_MIN_FRAME_BITS);
        assert_eq!(frame.layout().trailer.len(), BUFFER_BITS);
    }

    #[test]
    fn test_encoder_matches_free_function() {
        let encoder = BurstEncoder::new(FramingConfig::default()).unwrap();
        let payload = "1111101111110";
        assert_eq!(
            encoder.encode(payload).unwrap(),
            encode(payload, encoder.config()).unwrap()
        );
    }
}
