//! Waveform Trace Core Library
//!
//! A library for tracing the root cause of digital-circuit simulation
//! failures by cross-referencing two artifacts: a VCD waveform (every
//! signal's value over simulated time) and a structural JSON netlist (gates,
//! connections, and the modules containing them).
//!
//! # Architecture
//!
//! Two independent query engines feed one cross-reference step:
//! - [`WaveformStore`] parses a VCD stream into per-signal value histories
//!   and answers point-in-time and range queries
//! - [`NetlistGraph`] parses a Yosys-style JSON netlist into a per-module
//!   bit-level graph and answers driver lookup, bounded backward trace, and
//!   fan-in cone queries
//! - [`Debugger`] merges both into a single trace report: signal -> value ->
//!   driver type -> source location
//!
//! Everything is loaded once and queried synchronously; loaded state is
//! immutable, so queries are side-effect-free and idempotent.
//!
//! The library does NOT:
//! - Simulate logic
//! - Validate that waveform and netlist describe the same design revision
//! - Provide a CLI or compose natural-language reports
//!
//! Those belong to the application layer consuming this crate.
//!
//! # Example Usage
//!
//! ```no_run
//! use wavetrace_core::{Debugger, DebugOutcome, DEFAULT_TRACE_DEPTH};
//! use std::path::Path;
//!
//! let debugger = Debugger::from_files(
//!     Path::new("sim.vcd"),
//!     Path::new("connectivity.json"),
//! ).unwrap();
//!
//! match debugger.debug_signal("wfull", 1500, None, DEFAULT_TRACE_DEPTH).unwrap() {
//!     DebugOutcome::Trace(report) => println!("{report}"),
//!     DebugOutcome::NoTraceFound { available_modules, .. } => {
//!         eprintln!("no trace; try one of {available_modules:?}");
//!     }
//! }
//! ```

// Public modules
pub mod crossref;
pub mod netlist;
pub mod types;
pub mod waveform;

// Re-export main types for convenience
pub use crossref::{DebugOutcome, DebugReport, Debugger, FanInEntry, DEFAULT_TRACE_DEPTH};
pub use netlist::{
    CellInfo, NetlistGraph, NetlistStats, PortDirection, SignalInfo, TraceNode, INPUT_PORT,
};
pub use types::{Logic, Result, SignalValue, SimTime, TraceError};
pub use waveform::{ValueChange, VcdSignal, WaveformStats, WaveformStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
