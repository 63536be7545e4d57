//! End-to-end test: load a VCD dump and a JSON netlist from disk, then
//! cross-reference a FIFO full flag whose driver chain contains a
//! sequential feedback loop (flop output feeds its own next-state logic).

use std::io::Write;
use tempfile::NamedTempFile;
use wavetrace_core::{DebugOutcome, Debugger, INPUT_PORT};

/// wfull is registered: DFF_WFULL captures wfull_next = winc & !wfull
const VCD: &str = r##"$date today $end
$timescale 1ns $end
$scope module tb $end
$scope module fifo_ctrl $end
$var wire 1 ! clk $end
$var wire 1 " rst $end
$var wire 1 # winc $end
$var reg 1 $ wfull $end
$var wire 1 % wfull_next $end
$var wire 1 & nfull $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
0!
1"
0#
0$
0%
1&
#50
1!
0"
1#
1%
#100
0$
#150
1$
0%
0&
"##;

const NETLIST: &str = r##"{
    "modules": {
        "fifo_ctrl": {
            "attributes": {
                "top": "00000000000000000000000000000001",
                "hdlname": "fifo_ctrl",
                "src": "rtl/fifo_ctrl.v:1"
            },
            "ports": {
                "clk": {"direction": "input", "bits": [2]},
                "rst": {"direction": "input", "bits": [3]},
                "winc": {"direction": "input", "bits": [4]},
                "wfull": {"direction": "output", "bits": [5]}
            },
            "netnames": {
                "wfull_next": {"bits": [6], "attributes": {"src": "rtl/fifo_ctrl.v:20"}},
                "nfull": {"bits": [9], "attributes": {"src": "rtl/fifo_ctrl.v:21"}}
            },
            "cells": {
                "DFF_WFULL": {
                    "type": "DFF",
                    "port_directions": {"C": "input", "D": "input", "Q": "output"},
                    "connections": {"C": [2], "D": [6], "Q": [5]},
                    "attributes": {"src": "rtl/fifo_ctrl.v:25"}
                },
                "AND_NEXT": {
                    "type": "AND2",
                    "port_directions": {"A": "input", "B": "input", "Y": "output"},
                    "connections": {"A": [4], "B": [9], "Y": [6]},
                    "attributes": {"src": "rtl/fifo_ctrl.v:20"}
                },
                "INV_FULL": {
                    "type": "NOT",
                    "port_directions": {"A": "input", "Y": "output"},
                    "connections": {"A": [5], "Y": [9]},
                    "attributes": {"src": "rtl/fifo_ctrl.v:21"}
                }
            }
        }
    }
}"##;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn debugger() -> Debugger {
    let vcd = write_temp(VCD);
    let netlist = write_temp(NETLIST);
    Debugger::from_files(vcd.path(), netlist.path()).unwrap()
}

#[test]
fn cross_reference_registered_signal() {
    let dbg = debugger();

    let outcome = dbg.debug_signal("wfull", 200, None, 5).unwrap();
    let DebugOutcome::Trace(report) = outcome else {
        panic!("expected a trace");
    };

    assert_eq!(report.module, "fifo_ctrl");
    assert_eq!(report.value.as_ref().unwrap().to_string(), "1");

    // The trace walks through the flop into its next-state logic and stops
    // cleanly despite the wfull -> nfull -> wfull_next -> wfull loop.
    let names: Vec<&str> = report.trace.iter().map(|n| n.signal_name.as_str()).collect();
    assert_eq!(names, vec!["wfull", "clk", "wfull_next", "winc", "nfull"]);

    let wfull_node = &report.trace[0];
    assert_eq!(wfull_node.driver_cell.as_deref(), Some("DFF_WFULL"));
    assert_eq!(wfull_node.driver_type.as_deref(), Some("DFF"));
    assert_eq!(wfull_node.driver_port.as_deref(), Some("Q"));
    assert_eq!(wfull_node.src, "rtl/fifo_ctrl.v:25");

    let clk_node = &report.trace[1];
    assert_eq!(clk_node.driver_type.as_deref(), Some(INPUT_PORT));
    assert!(clk_node.inputs.is_empty());
}

#[test]
fn fan_in_values_cross_referenced_at_query_time() {
    let dbg = debugger();

    let outcome = dbg.debug_signal("wfull", 60, None, 5).unwrap();
    let DebugOutcome::Trace(report) = outcome else {
        panic!("expected a trace");
    };

    // At t=60: clk=1, winc=1, wfull=0, wfull_next=1, nfull=1
    let lookup = |name: &str| {
        report
            .fan_in
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("{name} missing from fan-in"))
    };
    assert_eq!(lookup("clk").value.as_ref().unwrap().to_string(), "1");
    assert_eq!(lookup("winc").value.as_ref().unwrap().to_string(), "1");
    assert_eq!(lookup("wfull").value.as_ref().unwrap().to_string(), "0");
    assert_eq!(lookup("wfull_next").value.as_ref().unwrap().to_string(), "1");
    assert_eq!(lookup("nfull").value.as_ref().unwrap().to_string(), "1");

    assert_eq!(lookup("winc").driver_type.as_deref(), Some(INPUT_PORT));
    assert_eq!(lookup("wfull_next").driver_type.as_deref(), Some("AND2"));
}

#[test]
fn fan_in_is_superset_of_trace_at_every_depth() {
    let dbg = debugger();
    for depth in 0..6 {
        let trace = dbg.netlist().backward_trace("fifo_ctrl", "wfull", depth);
        let fan_in = dbg.netlist().fan_in_signals("fifo_ctrl", "wfull", depth);
        for node in &trace {
            assert!(
                fan_in.contains(&node.signal_name),
                "depth {depth}: {} missing from fan-in",
                node.signal_name
            );
        }
    }
}

#[test]
fn waveform_point_queries_match_dump() {
    let dbg = debugger();
    let store = dbg.waveform();

    // Before any recorded change: unknown
    assert_eq!(store.value_at("wfull", -1), None);
    // Last-write-wins across the recorded history
    assert_eq!(store.value_at("wfull", 0).unwrap().to_string(), "0");
    assert_eq!(store.value_at("wfull", 149).unwrap().to_string(), "0");
    assert_eq!(store.value_at("wfull", 150).unwrap().to_string(), "1");
    assert_eq!(store.value_at("wfull", 10_000).unwrap().to_string(), "1");

    // Range query over the closed interval
    let ts = dbg.transitions("wfull", 100, 150);
    assert_eq!(ts.len(), 2);
    assert_eq!((ts[0].time, ts[1].time), (100, 150));

    // Path-qualified lookup
    assert_eq!(
        store
            .value_at_path("tb.fifo_ctrl.winc", 60)
            .unwrap()
            .to_string(),
        "1"
    );
}

#[test]
fn two_loaded_pairs_do_not_interfere() {
    // Same netlist, different simulation run: winc never asserts
    let other_vcd = "$scope module fifo_ctrl $end\n\
        $var wire 1 # winc $end\n\
        $upscope $end\n\
        $enddefinitions $end\n\
        #0\n0#\n";
    let first = debugger();
    let second = Debugger::new(
        wavetrace_core::WaveformStore::from_str(other_vcd),
        wavetrace_core::NetlistGraph::from_str(NETLIST).unwrap(),
    );

    assert_eq!(first.waveform().value_at("winc", 60).unwrap().to_string(), "1");
    assert_eq!(second.waveform().value_at("winc", 60).unwrap().to_string(), "0");
    // The first pair's answer is unchanged by the second load
    assert_eq!(first.waveform().value_at("winc", 60).unwrap().to_string(), "1");
}
