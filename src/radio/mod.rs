pub mod chain;
pub mod channel;

pub use chain::{Stage, TransmitChain};
pub use channel::{
    Channel, ChannelConfig, RfPlan, amplifier_gain_db, map_channel, samples_per_symbol,
    validate_if_gain,
};
