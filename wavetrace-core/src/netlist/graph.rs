//! Netlist graph
//!
//! Builds an in-memory graph from a structural netlist document and answers
//! backward-reachability queries: who drives a signal, the bounded-depth
//! driver chain behind it, and its fan-in cone.
//!
//! Per module, every electrical node is a flat bit index. Two maps make
//! traversal O(1) per hop: bit -> owning signal name (ports registered before
//! internal nets, first writer wins) and bit -> driving cell (each bit has at
//! most one driver; a bit with none is a primary input or an undriven node).

use crate::netlist::json::{self, NetlistDoc};
use crate::types::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::Path;

/// Driver tag for signals that are module input ports: traversal terminals
/// with no further fan-in.
pub const INPUT_PORT: &str = "INPUT_PORT";

/// Direction of a module or cell port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum PortDirection {
    Input,
    Output,
    Inout,
    /// Anything the source tool emitted that we do not recognize
    Unknown,
}

impl Default for PortDirection {
    fn default() -> Self {
        PortDirection::Unknown
    }
}

impl From<String> for PortDirection {
    fn from(s: String) -> Self {
        match s.as_str() {
            "input" => PortDirection::Input,
            "output" => PortDirection::Output,
            "inout" => PortDirection::Inout,
            _ => PortDirection::Unknown,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
            PortDirection::Inout => write!(f, "inout"),
            PortDirection::Unknown => write!(f, "unknown"),
        }
    }
}

/// A named signal (port or internal net) within one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalInfo {
    pub name: String,
    pub module: String,
    /// Flat bit indices covered by this signal
    pub bits: Vec<u64>,
    /// Source location attribute (e.g. `fifo.v:12`)
    pub src: String,
    pub is_port: bool,
    /// Port direction; `None` for internal nets
    pub direction: Option<PortDirection>,
}

/// A cell instance within one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellInfo {
    pub name: String,
    pub cell_type: String,
    pub module: String,
    pub port_directions: BTreeMap<String, PortDirection>,
    /// Per-port bit-index lists (constants already filtered out)
    pub connections: BTreeMap<String, Vec<u64>>,
    /// Source location attribute
    pub src: String,
}

/// One step of a backward trace: a visited signal and whatever drives it
///
/// Query-time-only record; it borrows nothing from the graph so callers can
/// keep it after further queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceNode {
    pub signal_name: String,
    pub module: String,
    /// Driving cell instance name; `None` for input-port terminals
    pub driver_cell: Option<String>,
    /// Driving cell type, or [`INPUT_PORT`] for input-port terminals
    pub driver_type: Option<String>,
    /// The output port of the driving cell that carries this signal's bit
    pub driver_port: Option<String>,
    /// Source location of the driver (or of the port itself)
    pub src: String,
    /// Input-direction ports of the driver and their bit indices - the
    /// fan-in edges a traversal continues along
    pub inputs: BTreeMap<String, Vec<u64>>,
}

/// Statistics about a loaded netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetlistStats {
    pub num_modules: usize,
    pub num_signals: usize,
    pub num_cells: usize,
}

/// Per-module connectivity, built once at load time
#[derive(Debug)]
struct ModuleGraph {
    /// Display alias (`hdlname` attribute), if any
    hdlname: Option<String>,
    /// True when the module carries the top-level marker
    is_top: bool,
    /// Signals by name (ports and nets; ports win name collisions)
    signals: BTreeMap<String, SignalInfo>,
    /// Cells by instance name
    cells: BTreeMap<String, CellInfo>,
    /// Bit index -> owning signal name (ports before nets, first writer wins)
    bit_to_signal: HashMap<u64, String>,
    /// Bit index -> driving cell instance name
    bit_to_driver: HashMap<u64, String>,
}

/// The netlist graph - loads a structural document once, answers driver and
/// reachability queries thereafter
pub struct NetlistGraph {
    modules: BTreeMap<String, ModuleGraph>,
}

impl NetlistGraph {
    /// Load a netlist from a JSON file on disk
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading netlist file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a netlist from JSON text already in memory
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let doc: NetlistDoc = serde_json::from_str(content)
            .map_err(|e| TraceError::NetlistParseError(e.to_string()))?;

        let mut modules = BTreeMap::new();
        for (module_name, module_doc) in &doc.modules {
            log::debug!("Processing module: {module_name}");
            modules.insert(module_name.clone(), build_module(module_name, module_doc));
        }

        let graph = Self { modules };
        let stats = graph.stats();
        log::info!(
            "Parsed netlist: {} modules, {} signals, {} cells",
            stats.num_modules,
            stats.num_signals,
            stats.num_cells
        );
        Ok(graph)
    }

    /// Find the cell that drives a signal
    ///
    /// Resolution follows the signal's first bit index. An input port with no
    /// driving cell yields a synthetic [`INPUT_PORT`] terminal node. `None`
    /// means the signal is unknown in this module or is an undriven net -
    /// neither is an error.
    pub fn find_driver(&self, module: &str, signal_name: &str) -> Option<TraceNode> {
        let m = self.modules.get(module)?;
        let sig = m.signals.get(signal_name)?;
        let first_bit = *sig.bits.first()?;

        let Some(driver_name) = m.bit_to_driver.get(&first_bit) else {
            if sig.is_port && sig.direction == Some(PortDirection::Input) {
                return Some(TraceNode {
                    signal_name: signal_name.to_string(),
                    module: module.to_string(),
                    driver_cell: None,
                    driver_type: Some(INPUT_PORT.to_string()),
                    driver_port: None,
                    src: sig.src.clone(),
                    inputs: BTreeMap::new(),
                });
            }
            return None;
        };
        let driver = m.cells.get(driver_name)?;

        // Which output port of the driver carries this bit
        let driver_port = driver
            .port_directions
            .iter()
            .filter(|(_, dir)| **dir == PortDirection::Output)
            .find(|(port, _)| {
                driver
                    .connections
                    .get(*port)
                    .is_some_and(|bits| bits.contains(&first_bit))
            })
            .map(|(port, _)| port.clone());

        // Input-side fan-in edges to continue tracing along
        let inputs = driver
            .port_directions
            .iter()
            .filter(|(_, dir)| **dir == PortDirection::Input)
            .map(|(port, _)| {
                (
                    port.clone(),
                    driver.connections.get(port).cloned().unwrap_or_default(),
                )
            })
            .collect();

        Some(TraceNode {
            signal_name: signal_name.to_string(),
            module: module.to_string(),
            driver_cell: Some(driver.name.clone()),
            driver_type: Some(driver.cell_type.clone()),
            driver_port,
            src: driver.src.clone(),
            inputs,
        })
    }

    /// Breadth-first backward trace from a signal, bounded by `max_depth`
    /// hops from the origin
    ///
    /// Nodes appear in discovery order (nearest causes first). A visited-set
    /// keyed by signal name plus the depth bound guarantee termination even
    /// over combinational loops and reconvergent fan-in. An unknown signal
    /// yields an empty trace, not an error.
    pub fn backward_trace(
        &self,
        module: &str,
        signal_name: &str,
        max_depth: usize,
    ) -> Vec<TraceNode> {
        let Some(m) = self.modules.get(module) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((signal_name.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth || !visited.insert(current.clone()) {
                continue;
            }

            let Some(node) = self.find_driver(module, &current) else {
                continue;
            };

            for bits in node.inputs.values() {
                for bit in bits {
                    if let Some(input_signal) = m.bit_to_signal.get(bit) {
                        if !visited.contains(input_signal) {
                            queue.push_back((input_signal.clone(), depth + 1));
                        }
                    }
                }
            }
            result.push(node);
        }

        log::debug!(
            "Backward trace of {module}/{signal_name} (depth {max_depth}): {} nodes",
            result.len()
        );
        result
    }

    /// Every signal name that can influence `signal_name` within `max_depth`
    /// hops: the union of all traced signals and all input-side signals they
    /// reference - a superset of the trace path itself
    pub fn fan_in_signals(
        &self,
        module: &str,
        signal_name: &str,
        max_depth: usize,
    ) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let Some(m) = self.modules.get(module) else {
            return names;
        };

        for node in self.backward_trace(module, signal_name, max_depth) {
            names.insert(node.signal_name);
            for bits in node.inputs.values() {
                for bit in bits {
                    if let Some(sig) = m.bit_to_signal.get(bit) {
                        names.insert(sig.clone());
                    }
                }
            }
        }
        names
    }

    /// The module carrying the top-level marker, if any
    ///
    /// When absent the caller decides the fallback policy (typically the
    /// first module).
    pub fn top_module(&self) -> Option<&str> {
        self.modules
            .iter()
            .find(|(_, m)| m.is_top)
            .map(|(name, _)| name.as_str())
    }

    /// Display alias of a module (`hdlname` attribute), falling back to the
    /// internal name
    pub fn display_name<'a>(&'a self, module: &'a str) -> &'a str {
        self.modules
            .get(module)
            .and_then(|m| m.hdlname.as_deref())
            .unwrap_or(module)
    }

    /// All module names, in stable (sorted) order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// All signal names (ports and nets) of a module
    pub fn signal_names(&self, module: &str) -> Vec<&str> {
        self.modules
            .get(module)
            .map(|m| m.signals.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Look up a signal (port or net) within a module
    pub fn signal(&self, module: &str, signal_name: &str) -> Option<&SignalInfo> {
        self.modules.get(module)?.signals.get(signal_name)
    }

    /// Look up a cell instance within a module
    pub fn cell(&self, module: &str, cell_name: &str) -> Option<&CellInfo> {
        self.modules.get(module)?.cells.get(cell_name)
    }

    /// The signal name owning a bit index within a module
    pub fn signal_for_bit(&self, module: &str, bit: u64) -> Option<&str> {
        self.modules
            .get(module)?
            .bit_to_signal
            .get(&bit)
            .map(String::as_str)
    }

    /// Get statistics about the loaded netlist
    pub fn stats(&self) -> NetlistStats {
        NetlistStats {
            num_modules: self.modules.len(),
            num_signals: self.modules.values().map(|m| m.signals.len()).sum(),
            num_cells: self.modules.values().map(|m| m.cells.len()).sum(),
        }
    }
}

/// Build one module's connectivity maps from its document
fn build_module(module_name: &str, doc: &json::ModuleDoc) -> ModuleGraph {
    let mut m = ModuleGraph {
        hdlname: doc
            .attributes
            .get("hdlname")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        is_top: doc.attributes.contains_key("top"),
        signals: BTreeMap::new(),
        cells: BTreeMap::new(),
        bit_to_signal: HashMap::new(),
        bit_to_driver: HashMap::new(),
    };
    let module_src = json::string_attribute(&doc.attributes, "src", "unknown");

    // Ports first: they take priority for both signal identity and
    // bit ownership.
    for (port_name, port) in &doc.ports {
        let bits = json::bit_indices(&port.bits);
        for &bit in &bits {
            m.bit_to_signal.entry(bit).or_insert_with(|| port_name.clone());
        }
        m.signals.insert(
            port_name.clone(),
            SignalInfo {
                name: port_name.clone(),
                module: module_name.to_string(),
                bits,
                src: module_src.to_string(),
                is_port: true,
                direction: Some(port.direction),
            },
        );
    }

    // Internal nets: registered only where a port has not already claimed
    // the name / the bit.
    for (net_name, net) in &doc.netnames {
        let bits = json::bit_indices(&net.bits);
        for &bit in &bits {
            m.bit_to_signal.entry(bit).or_insert_with(|| net_name.clone());
        }
        m.signals.entry(net_name.clone()).or_insert_with(|| SignalInfo {
            name: net_name.clone(),
            module: module_name.to_string(),
            bits,
            src: json::string_attribute(&net.attributes, "src", "unknown").to_string(),
            is_port: false,
            direction: None,
        });
    }

    // Cells: record metadata and mark every output bit as driven.
    for (cell_name, cell) in &doc.cells {
        let cell_type = if cell.cell_type.is_empty() {
            "unknown".to_string()
        } else {
            cell.cell_type.clone()
        };
        let connections: BTreeMap<String, Vec<u64>> = cell
            .connections
            .iter()
            .map(|(port, bits)| (port.clone(), json::bit_indices(bits)))
            .collect();

        for (port, dir) in &cell.port_directions {
            if *dir == PortDirection::Output {
                if let Some(bits) = connections.get(port) {
                    for &bit in bits {
                        m.bit_to_driver.entry(bit).or_insert_with(|| cell_name.clone());
                    }
                }
            }
        }

        m.cells.insert(
            cell_name.clone(),
            CellInfo {
                name: cell_name.clone(),
                cell_type,
                module: module_name.to_string(),
                port_directions: cell.port_directions.clone(),
                connections,
                src: json::string_attribute(&cell.attributes, "src", "unknown").to_string(),
            },
        );
    }

    m
}
