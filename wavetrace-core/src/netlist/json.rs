//! Document model for the structural netlist JSON format
//!
//! Matches the Yosys `write_json` layout: a top-level `modules` map where
//! each module carries `ports`, `netnames`, and `cells`, all keyed by name.
//! Everything is optional-with-default so partial or tool-extended documents
//! still deserialize; unknown keys are ignored by serde's default behavior.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level netlist document
#[derive(Debug, Deserialize)]
pub(crate) struct NetlistDoc {
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleDoc>,
}

/// One module: a named container of ports, nets, and cells
#[derive(Debug, Deserialize)]
pub(crate) struct ModuleDoc {
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub ports: BTreeMap<String, PortDoc>,
    #[serde(default)]
    pub netnames: BTreeMap<String, NetDoc>,
    #[serde(default)]
    pub cells: BTreeMap<String, CellDoc>,
}

/// A module port: direction plus the bit indices it covers
#[derive(Debug, Deserialize)]
pub(crate) struct PortDoc {
    #[serde(default)]
    pub direction: crate::netlist::graph::PortDirection,
    #[serde(default)]
    pub bits: Vec<BitRef>,
}

/// An internal net: bit indices plus source-location attributes
#[derive(Debug, Deserialize)]
pub(crate) struct NetDoc {
    #[serde(default)]
    pub bits: Vec<BitRef>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A cell instance: type, per-port directions, and per-port connections
#[derive(Debug, Deserialize)]
pub(crate) struct CellDoc {
    #[serde(rename = "type", default)]
    pub cell_type: String,
    #[serde(default)]
    pub port_directions: BTreeMap<String, crate::netlist::graph::PortDirection>,
    #[serde(default)]
    pub connections: BTreeMap<String, Vec<BitRef>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// One entry of a `bits` list: either a bit index or a constant driver
/// (`"0"`, `"1"`, `"x"`), which carries no connectivity
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum BitRef {
    Index(u64),
    Constant(String),
}

impl BitRef {
    /// The bit index, unless this entry is a constant
    pub fn index(&self) -> Option<u64> {
        match self {
            BitRef::Index(i) => Some(*i),
            BitRef::Constant(_) => None,
        }
    }
}

/// Collect the integer bit indices of a `bits` list, dropping constants
pub(crate) fn bit_indices(bits: &[BitRef]) -> Vec<u64> {
    bits.iter().filter_map(BitRef::index).collect()
}

/// Extract a string attribute, or a fallback when absent or non-string
pub(crate) fn string_attribute<'a>(
    attributes: &'a BTreeMap<String, serde_json::Value>,
    key: &str,
    fallback: &'a str,
) -> &'a str {
    attributes
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_refs_mix_indices_and_constants() {
        let doc: NetDoc = serde_json::from_str(r#"{"bits": [2, "0", 3, "x", 7]}"#).unwrap();
        assert_eq!(bit_indices(&doc.bits), vec![2, 3, 7]);
    }

    #[test]
    fn test_module_defaults() {
        let doc: ModuleDoc = serde_json::from_str("{}").unwrap();
        assert!(doc.ports.is_empty());
        assert!(doc.netnames.is_empty());
        assert!(doc.cells.is_empty());
    }

    #[test]
    fn test_string_attribute_fallback() {
        let doc: NetDoc =
            serde_json::from_str(r#"{"bits": [], "attributes": {"src": "fifo.v:12"}}"#).unwrap();
        assert_eq!(string_attribute(&doc.attributes, "src", "unknown"), "fifo.v:12");
        assert_eq!(string_attribute(&doc.attributes, "hdlname", "fallback"), "fallback");
    }
}
