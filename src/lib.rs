//! AIS burst transmitter core
//!
//! Frames pre-encoded AIS bit strings into ITU-R M.1371-4 bursts and feeds
//! them, one at a time, to an external modulation / RF stage.

pub mod error;
pub mod net;
pub mod phy;
pub mod radio;
pub mod transmission;
pub mod utils;
