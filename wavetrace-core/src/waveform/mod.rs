//! Waveform store: VCD parsing and point-in-time value queries

pub mod store;
pub(crate) mod vcd;

pub use store::{ValueChange, VcdSignal, WaveformStats, WaveformStore};
