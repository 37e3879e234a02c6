//! Channel and RF parameter mapping
//!
//! Turns the operator-facing settings (channel letter, rates, gains) into the
//! validated numbers the modulator and RF sink need.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;
use crate::utils::consts::*;

/// The two ITU-assigned AIS VHF channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    /// 161.975 MHz (87B)
    A,
    /// 162.025 MHz (88B)
    B,
}

impl Channel {
    pub fn index(self) -> u64 {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Channel::A),
            "B" => Ok(Channel::B),
            other => Err(ConfigError::InvalidChannel(other.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

/// Center frequency of an AIS channel in Hz.
pub fn map_channel(channel: Channel) -> u64 {
    AIS_BASE_FREQUENCY_HZ + AIS_CHANNEL_SPACING_HZ * channel.index()
}

/// `floor(sample_rate / bit_rate)`, at least one.
pub fn samples_per_symbol(sample_rate: u32, bit_rate: u32) -> Result<u32, ConfigError> {
    if bit_rate == 0 {
        return Err(ConfigError::ZeroBitRate);
    }
    match sample_rate / bit_rate {
        0 => Err(ConfigError::SamplesPerSymbol {
            sample_rate,
            bit_rate,
        }),
        sps => Ok(sps),
    }
}

/// RF amplifier is all-or-nothing.
pub fn amplifier_gain_db(enabled: bool) -> u32 {
    if enabled { AMP_GAIN_DB } else { 0 }
}

pub fn validate_if_gain(if_gain_db: i32) -> Result<u32, ConfigError> {
    if (IF_GAIN_MIN_DB..=IF_GAIN_MAX_DB).contains(&if_gain_db) {
        Ok(if_gain_db as u32)
    } else {
        Err(ConfigError::IfGainOutOfRange(if_gain_db))
    }
}

/// Operator-facing channel settings, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelConfig {
    pub channel: Channel,
    pub sample_rate: u32,
    pub bit_rate: u32,
    /// Oscillator correction; the valid span depends on the hardware
    pub frequency_correction_ppm: i32,
    pub amplifier_enabled: bool,
    pub if_gain: i32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            channel: Channel::A,
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_rate: DEFAULT_BIT_RATE,
            frequency_correction_ppm: 0,
            amplifier_enabled: false,
            if_gain: DEFAULT_IF_GAIN_DB,
        }
    }
}

/// Validated numbers for the modulator and RF sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RfPlan {
    pub channel: Channel,
    pub center_frequency_hz: u64,
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub samples_per_symbol: u32,
    pub frequency_correction_ppm: i32,
    pub rf_gain_db: u32,
    pub if_gain_db: u32,
    pub bb_gain_db: u32,
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<RfPlan, ConfigError> {
        Ok(RfPlan {
            channel: self.channel,
            center_frequency_hz: map_channel(self.channel),
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            samples_per_symbol: samples_per_symbol(self.sample_rate, self.bit_rate)?,
            frequency_correction_ppm: self.frequency_correction_ppm,
            rf_gain_db: amplifier_gain_db(self.amplifier_enabled),
            if_gain_db: validate_if_gain(self.if_gain)?,
            bb_gain_db: BB_GAIN_DB,
        })
    }
}
