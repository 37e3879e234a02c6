// Transmit chain description: Framer -> GMSK -> Scale -> RF sink
//
// Compiled once from validated settings and never mutated. Changing any
// parameter means building a new chain and restarting the pipeline.

use serde::Serialize;
use tracing::info;

use super::channel::{ChannelConfig, RfPlan};
use crate::error::ConfigError;
use crate::phy::FramingConfig;
use crate::utils::consts::{GMSK_BT, OUTPUT_SCALE};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Framer(FramingConfig),
    GmskModulator { samples_per_symbol: u32, bt: f32 },
    Scale { factor: f32 },
    RfSink(RfPlan),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Framer(_) => "framer",
            Stage::GmskModulator { .. } => "gmsk_modulator",
            Stage::Scale { .. } => "scale",
            Stage::RfSink(_) => "rf_sink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransmitChain {
    stages: Vec<Stage>,
    #[serde(skip)]
    framing: FramingConfig,
    #[serde(skip)]
    plan: RfPlan,
}

impl TransmitChain {
    pub fn compile(
        framing: &FramingConfig,
        channel: &ChannelConfig,
    ) -> Result<Self, ConfigError> {
        framing.validate()?;
        let plan = channel.validate()?;

        let stages = vec![
            Stage::Framer(framing.clone()),
            Stage::GmskModulator {
                samples_per_symbol: plan.samples_per_symbol,
                bt: GMSK_BT,
            },
            Stage::Scale {
                factor: OUTPUT_SCALE,
            },
            Stage::RfSink(plan.clone()),
        ];

        Ok(Self {
            stages,
            framing: framing.clone(),
            plan,
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn framing(&self) -> &FramingConfig {
        &self.framing
    }

    pub fn rf_plan(&self) -> &RfPlan {
        &self.plan
    }

    pub fn log_summary(&self) {
        let plan = self.rf_plan();
        info!(
            "Transmit chain: {}",
            self.stages
                .iter()
                .map(Stage::name)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        info!(
            "  - channel {} @ {} Hz (ppm {})",
            plan.channel, plan.center_frequency_hz, plan.frequency_correction_ppm
        );
        info!(
            "  - {} S/s, {} Bd, {} samples/symbol",
            plan.sample_rate, plan.bit_rate, plan.samples_per_symbol
        );
        info!(
            "  - gains: RF {} dB, IF {} dB, BB {} dB",
            plan.rf_gain_db, plan.if_gain_db, plan.bb_gain_db
        );
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
