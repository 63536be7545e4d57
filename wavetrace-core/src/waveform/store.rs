//! Waveform store
//!
//! Holds the fully parsed value-change histories of one simulation run and
//! answers point-in-time, range, and name-lookup queries. All state is
//! immutable after load, so any number of queries may be issued (including
//! concurrently) without interference.

use crate::types::{Result, SignalValue, SimTime};
use crate::waveform::vcd;
use std::collections::HashMap;
use std::path::Path;

/// A signal definition from the VCD header
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VcdSignal {
    /// VCD identifier code (one or more printable characters, e.g. `!`)
    pub id: String,
    /// Declared name (e.g. `wfull`)
    pub name: String,
    /// Declared bit width
    pub width: u32,
    /// Fully qualified hierarchical path (scope stack joined with `.`)
    pub path: String,
    /// Declared kind (`wire`, `reg`, ...)
    pub var_type: String,
}

/// A single value change event
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValueChange {
    /// Timestamp in timescale units
    pub time: SimTime,
    /// The value the signal took at that time
    pub value: SignalValue,
}

/// Statistics about a loaded waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformStats {
    /// Number of declared signals
    pub num_signals: usize,
    /// Total number of recorded value changes
    pub num_changes: usize,
}

/// The waveform store - loads a VCD stream once, answers queries thereafter
pub struct WaveformStore {
    /// Signal definitions by identifier code
    signals: HashMap<String, VcdSignal>,
    /// Identifier codes in declaration order (drives deterministic
    /// first-declared resolution and stable listing order)
    declaration_order: Vec<String>,
    /// Hierarchical path -> identifier code
    by_path: HashMap<String, String>,
    /// Declared name -> identifier codes, in declaration order
    by_name: HashMap<String, Vec<String>>,
    /// Per-signal value histories, time-ascending as they appeared in the dump
    changes: HashMap<String, Vec<ValueChange>>,
    /// Raw `$timescale` body
    timescale: String,
}

impl WaveformStore {
    /// Load a waveform from a VCD file on disk
    ///
    /// Only an unreadable file is fatal; malformed lines inside the file are
    /// skipped (see [`crate::waveform::vcd`]).
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading VCD file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&content))
    }

    /// Load a waveform from VCD text already in memory
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        let parsed = vcd::parse(content);

        let mut by_path = HashMap::new();
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();
        for id in &parsed.declaration_order {
            let signal = &parsed.signals[id];
            by_path.insert(signal.path.clone(), id.clone());
            by_name
                .entry(signal.name.clone())
                .or_default()
                .push(id.clone());
        }

        Self {
            signals: parsed.signals,
            declaration_order: parsed.declaration_order,
            by_path,
            by_name,
            changes: parsed.changes,
            timescale: parsed.timescale,
        }
    }

    /// Get a signal's value at a specific time
    ///
    /// Returns the value in effect at or immediately before `time`
    /// (last-write-wins), or `None` if the signal is unknown or has no
    /// change at or before that time.
    ///
    /// When several signals share `name` across different scopes, the
    /// first-declared one is used. Callers needing precision should use
    /// [`WaveformStore::value_at_path`].
    pub fn value_at(&self, name: &str, time: SimTime) -> Option<&SignalValue> {
        let id = self.by_name.get(name)?.first()?;
        self.value_of_id(id, time)
    }

    /// Get a signal's value at a specific time, resolved by exact
    /// hierarchical path (never ambiguous)
    pub fn value_at_path(&self, path: &str, time: SimTime) -> Option<&SignalValue> {
        let id = self.by_path.get(path)?;
        self.value_of_id(id, time)
    }

    fn value_of_id(&self, id: &str, time: SimTime) -> Option<&SignalValue> {
        let history = self.changes.get(id)?;
        // Histories are chronological as parsed; a linear scan is fine for
        // interactive query volumes.
        let mut value = None;
        for change in history {
            if change.time <= time {
                value = Some(&change.value);
            } else {
                break;
            }
        }
        value
    }

    /// Get all value changes of a signal within the closed interval
    /// `[start, end]`
    ///
    /// Resolves `name` like [`WaveformStore::value_at`]. Unknown signals
    /// yield an empty vector.
    pub fn transitions(&self, name: &str, start: SimTime, end: SimTime) -> Vec<&ValueChange> {
        let Some(id) = self.by_name.get(name).and_then(|ids| ids.first()) else {
            return Vec::new();
        };
        self.changes
            .get(id)
            .map(|history| {
                history
                    .iter()
                    .filter(|c| c.time >= start && c.time <= end)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find all signal definitions whose declared name contains `pattern`
    /// (case-insensitive), across all paths
    pub fn find_signals(&self, pattern: &str) -> Vec<&VcdSignal> {
        let needle = pattern.to_lowercase();
        self.declaration_order
            .iter()
            .filter_map(|id| self.signals.get(id))
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// List all distinct declared signal names, in declaration order
    pub fn signal_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.declaration_order
            .iter()
            .filter_map(|id| self.signals.get(id))
            .map(|s| s.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Look up a signal definition by declared name (first-declared wins)
    pub fn signal(&self, name: &str) -> Option<&VcdSignal> {
        let id = self.by_name.get(name)?.first()?;
        self.signals.get(id)
    }

    /// The `$timescale` declaration from the header (default `1ps`)
    pub fn timescale(&self) -> &str {
        &self.timescale
    }

    /// Get statistics about the loaded waveform
    pub fn stats(&self) -> WaveformStats {
        WaveformStats {
            num_signals: self.signals.len(),
            num_changes: self.changes.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"$timescale 1ns $end
$scope module tb $end
$var wire 1 ! wfull $end
$var reg 4 " wptr [3:0] $end
$scope module inner $end
$var wire 1 # wfull $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
0!
0#
b0000 "
#100
1!
b0101 "
#250
0!
"#;

    fn store() -> WaveformStore {
        WaveformStore::from_str(SAMPLE)
    }

    #[test]
    fn test_value_at_time() {
        let store = store();
        assert_eq!(store.value_at("wfull", 50).unwrap().to_string(), "0");
        assert_eq!(store.value_at("wfull", 100).unwrap().to_string(), "1");
        assert_eq!(store.value_at("wfull", 150).unwrap().to_string(), "1");
        assert_eq!(store.value_at("wfull", 300).unwrap().to_string(), "0");
        // Before any recorded change: unknown
        assert_eq!(store.value_at("wfull", -1), None);
        assert_eq!(store.value_at("nosuchsignal", 100), None);
    }

    #[test]
    fn test_ambiguous_name_uses_first_declared() {
        let store = store();
        // Two signals named wfull; the bare name resolves to tb.wfull,
        // path-qualified lookup stays exact.
        let sig = store.signal("wfull").unwrap();
        assert_eq!(sig.path, "tb.wfull");
        assert!(store.value_at_path("tb.inner.wfull", 10).is_some());
        assert!(store.value_at_path("tb.wfull", 10).is_some());
        assert_eq!(store.value_at_path("tb.nope.wfull", 10), None);
    }

    #[test]
    fn test_transitions_closed_interval() {
        let store = store();
        let ts = store.transitions("wfull", 0, 100);
        assert_eq!(ts.len(), 2);
        assert_eq!(ts[0].time, 0);
        assert_eq!(ts[1].time, 100);

        let ts = store.transitions("wfull", 101, 249);
        assert!(ts.is_empty());

        assert!(store.transitions("nosuchsignal", 0, 1000).is_empty());
    }

    #[test]
    fn test_find_signals_case_insensitive() {
        let store = store();
        let found = store.find_signals("WF");
        // Both wfull declarations match, not deduplicated by path
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "tb.wfull");
        assert_eq!(found[1].path, "tb.inner.wfull");

        assert!(store.find_signals("zzz").is_empty());
    }

    #[test]
    fn test_signal_names_distinct() {
        let store = store();
        assert_eq!(store.signal_names(), vec!["wfull", "wptr"]);
    }

    #[test]
    fn test_monotonic_consistency() {
        let store = store();
        // No change in (101, 240]: values at both ends are equal
        assert_eq!(store.value_at("wfull", 101), store.value_at("wfull", 240));
        // Change at 250 lies in (240, 260]: values differ
        assert_ne!(store.value_at("wfull", 240), store.value_at("wfull", 260));
    }

    #[test]
    fn test_stats() {
        let store = store();
        let stats = store.stats();
        assert_eq!(stats.num_signals, 3);
        assert_eq!(stats.num_changes, 6);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let store = WaveformStore::from_file(file.path()).unwrap();
        assert_eq!(store.timescale(), "1ns");
        assert_eq!(store.value_at("wptr", 120).unwrap().to_string(), "b0101");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = WaveformStore::from_file(Path::new("no/such/file.vcd"));
        assert!(result.is_err());
    }
}
