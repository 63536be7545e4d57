//! Netlist graph: structural JSON parsing and backward-reachability queries

pub mod graph;
pub(crate) mod json;

pub use graph::{
    CellInfo, NetlistGraph, NetlistStats, PortDirection, SignalInfo, TraceNode, INPUT_PORT,
};
