//! Cross-referencer
//!
//! Composes the waveform store and the netlist graph into one debugging view:
//! given a signal name and a time, it pairs the recorded value with the
//! driver chain and fan-in cone behind it. The debugger holds explicit store
//! and graph instances, so several waveform/netlist pairs (e.g. two
//! simulation runs being compared) can coexist in one process.

use crate::netlist::{NetlistGraph, TraceNode};
use crate::types::{Result, SignalValue, SimTime, TraceError};
use crate::waveform::{ValueChange, WaveformStore};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Default backward-trace depth for interactive queries
pub const DEFAULT_TRACE_DEPTH: usize = 5;

/// One fan-in signal paired with its value at the queried time
///
/// `driver_type` is best-effort: signals inside the fan-in cone but outside
/// the trace path carry no annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanInEntry {
    pub name: String,
    /// Value at the queried time; `None` when absent from the waveform
    pub value: Option<SignalValue>,
    /// Driver annotation discovered during the trace, if any
    pub driver_type: Option<String>,
}

/// A complete cross-referenced trace report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugReport {
    pub signal: String,
    pub time: SimTime,
    /// Internal module name the trace ran in
    pub module: String,
    /// Human-readable module alias
    pub module_display: String,
    /// Value of the target signal; `None` means "not found in waveform"
    pub value: Option<SignalValue>,
    /// Backward trace in breadth-first discovery order
    pub trace: Vec<TraceNode>,
    /// Fan-in cone with cross-referenced values, sorted by signal name
    pub fan_in: Vec<FanInEntry>,
}

/// Outcome of a debug query
///
/// "No trace found" is an explicit result rather than an error, so callers
/// can fall back to listing the available modules and signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DebugOutcome {
    /// A trace was found; here is the full report
    Trace(DebugReport),
    /// The resolved module knows nothing about the signal
    NoTraceFound {
        signal: String,
        module: String,
        /// Module display names the caller may offer instead
        available_modules: Vec<String>,
    },
}

/// The debugger - one loaded waveform/netlist pair and the queries over them
pub struct Debugger {
    waveform: WaveformStore,
    netlist: NetlistGraph,
}

impl Debugger {
    /// Build a debugger from already-loaded engines
    pub fn new(waveform: WaveformStore, netlist: NetlistGraph) -> Self {
        Self { waveform, netlist }
    }

    /// Load both artifacts from disk
    pub fn from_files(vcd_path: &Path, netlist_path: &Path) -> Result<Self> {
        Ok(Self::new(
            WaveformStore::from_file(vcd_path)?,
            NetlistGraph::from_file(netlist_path)?,
        ))
    }

    /// The underlying waveform store
    pub fn waveform(&self) -> &WaveformStore {
        &self.waveform
    }

    /// The underlying netlist graph
    pub fn netlist(&self) -> &NetlistGraph {
        &self.netlist
    }

    /// Cross-reference a signal at a point in time
    ///
    /// Resolves `module` to the top module (or the first module) when
    /// omitted, fetches the target value from the waveform (absence is
    /// reported, never fatal), runs the backward trace and fan-in queries,
    /// and pairs every fan-in signal with its value at `time`.
    ///
    /// Returns [`DebugOutcome::NoTraceFound`] when the module has no signal
    /// of that name, no driver, and no fan-in. Fails only when the netlist
    /// contains no modules at all.
    pub fn debug_signal(
        &self,
        signal: &str,
        time: SimTime,
        module: Option<&str>,
        depth: usize,
    ) -> Result<DebugOutcome> {
        let module = match module {
            Some(m) => m.to_string(),
            None => self.resolve_module()?,
        };
        log::debug!("Debugging '{signal}' at time {time} in '{module}' (depth {depth})");

        let value = self.waveform.value_at(signal, time).cloned();
        let trace = self.netlist.backward_trace(&module, signal, depth);
        let fan_in_names = self.netlist.fan_in_signals(&module, signal, depth);

        if trace.is_empty()
            && fan_in_names.is_empty()
            && self.netlist.signal(&module, signal).is_none()
        {
            return Ok(DebugOutcome::NoTraceFound {
                signal: signal.to_string(),
                module: self.netlist.display_name(&module).to_string(),
                available_modules: self
                    .netlist
                    .module_names()
                    .iter()
                    .map(|m| self.netlist.display_name(m).to_string())
                    .collect(),
            });
        }

        let fan_in = fan_in_names
            .into_iter()
            .map(|name| {
                let value = self.waveform.value_at(&name, time).cloned();
                let driver_type = trace
                    .iter()
                    .find(|node| node.signal_name == name)
                    .and_then(|node| node.driver_type.clone());
                FanInEntry {
                    name,
                    value,
                    driver_type,
                }
            })
            .collect();

        Ok(DebugOutcome::Trace(DebugReport {
            signal: signal.to_string(),
            time,
            module_display: self.netlist.display_name(&module).to_string(),
            module,
            value,
            trace,
            fan_in,
        }))
    }

    /// All value changes of a signal within `[start, end]`
    pub fn transitions(&self, signal: &str, start: SimTime, end: SimTime) -> Vec<&ValueChange> {
        self.waveform.transitions(signal, start, end)
    }

    /// Top module if flagged, otherwise the first module
    fn resolve_module(&self) -> Result<String> {
        if let Some(top) = self.netlist.top_module() {
            return Ok(top.to_string());
        }
        self.netlist
            .module_names()
            .first()
            .map(|m| m.to_string())
            .ok_or(TraceError::EmptyNetlist)
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Debugging '{}' at time {} in '{}'",
            self.signal, self.time, self.module_display
        )?;
        match &self.value {
            Some(v) => writeln!(f, "Target: {} = {}", self.signal, v)?,
            None => writeln!(f, "Target: {} = NOT_FOUND_IN_WAVEFORM", self.signal)?,
        }

        writeln!(f, "Backward trace ({} nodes):", self.trace.len())?;
        for node in &self.trace {
            let driver = node.driver_type.as_deref().unwrap_or("INPUT");
            // Keep only the file part of the source path
            let src = node.src.rsplit('/').next().unwrap_or(&node.src);
            writeln!(f, "  {:30} <- {:15} ({})", node.signal_name, driver, src)?;
        }

        writeln!(f, "Fan-in cone ({} signals):", self.fan_in.len())?;
        for entry in &self.fan_in {
            let value = entry
                .value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            let driver = entry
                .driver_type
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            writeln!(f, "  {:30} = {:15}{}", entry.name, value, driver)?;
        }
        Ok(())
    }
}
