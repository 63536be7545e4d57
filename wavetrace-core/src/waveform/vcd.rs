//! VCD (Value Change Dump) text parser
//!
//! Parses the two regions of a VCD stream: the declaration header (scopes and
//! variable definitions, terminated by `$enddefinitions`) and the value
//! section (timestamp cursors plus scalar/vector value changes).
//!
//! The parser is deliberately tolerant: unrecognized directives, malformed
//! lines, and value changes for undeclared signal IDs are skipped rather than
//! rejected, so dumps carrying tool-specific extensions or partial signal
//! subsets still load.

use crate::types::{SignalValue, SimTime};
use crate::waveform::store::{ValueChange, VcdSignal};
use std::collections::HashMap;

/// Raw parse output, before the store builds its lookup indexes
pub(crate) struct ParsedVcd {
    /// Signal definitions keyed by VCD identifier code
    pub signals: HashMap<String, VcdSignal>,
    /// Identifier codes in declaration order
    pub declaration_order: Vec<String>,
    /// Per-signal value histories, keyed by identifier code
    pub changes: HashMap<String, Vec<ValueChange>>,
    /// Raw `$timescale` body (e.g. "1ps")
    pub timescale: String,
}

/// Parse a complete VCD document
pub(crate) fn parse(content: &str) -> ParsedVcd {
    let mut parsed = ParsedVcd {
        signals: HashMap::new(),
        declaration_order: Vec::new(),
        changes: HashMap::new(),
        timescale: "1ps".to_string(),
    };

    let mut lines = content.lines();
    parse_header(&mut lines, &mut parsed);
    parse_values(&mut lines, &mut parsed);

    log::info!(
        "Parsed VCD: {} signals, timescale {}",
        parsed.signals.len(),
        parsed.timescale
    );
    parsed
}

/// Parse the declaration header, consuming lines up to `$enddefinitions`
fn parse_header<'a>(lines: &mut impl Iterator<Item = &'a str>, parsed: &mut ParsedVcd) {
    let mut scope_stack: Vec<String> = Vec::new();
    let mut pending_timescale = false;

    for line in lines {
        let line = line.trim();

        if line.starts_with("$enddefinitions") {
            break;
        }

        // $timescale may carry its body on the following line(s)
        if pending_timescale {
            let body = line.trim_end_matches("$end").trim();
            if !body.is_empty() {
                parsed.timescale = body.to_string();
            }
            if !body.is_empty() || line.contains("$end") {
                pending_timescale = false;
            }
            continue;
        }

        let Some((directive, rest)) = split_directive(line) else {
            continue;
        };
        match directive {
            "$scope" => {
                // $scope TYPE NAME $end
                let tokens: Vec<&str> = rest.split_whitespace().collect();
                if tokens.len() >= 2 {
                    scope_stack.push(tokens[1].to_string());
                } else {
                    log::warn!("Skipping malformed $scope line: {line}");
                }
            }
            "$upscope" => {
                scope_stack.pop();
            }
            "$timescale" => {
                let body = rest.trim_end_matches("$end").trim();
                if body.is_empty() {
                    pending_timescale = true;
                } else {
                    parsed.timescale = body.to_string();
                }
            }
            "$var" => {
                if let Some(signal) = parse_var(rest, &scope_stack) {
                    parsed.changes.insert(signal.id.clone(), Vec::new());
                    parsed.declaration_order.push(signal.id.clone());
                    parsed.signals.insert(signal.id.clone(), signal);
                } else {
                    log::warn!("Skipping malformed $var line: {line}");
                }
            }
            // Any other directive ($date, $version, $comment, ...) is ignored.
            _ => {}
        }
    }
}

/// Split a header line into its leading directive and the remainder
fn split_directive(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('$') {
        return None;
    }
    match line.find(char::is_whitespace) {
        Some(pos) => Some((&line[..pos], &line[pos..])),
        None => Some((line, "")),
    }
}

/// Parse one `$var TYPE WIDTH ID NAME [MSB:LSB] $end` declaration body
fn parse_var(rest: &str, scope_stack: &[String]) -> Option<VcdSignal> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    // TYPE WIDTH ID NAME ... $end (optional bit range between NAME and $end)
    if tokens.len() < 5 || *tokens.last()? != "$end" {
        return None;
    }

    let var_type = tokens[0].to_string();
    let width: u32 = tokens[1].parse().ok()?;
    let id = tokens[2].to_string();
    let name = tokens[3].to_string();

    let mut path_parts: Vec<&str> = scope_stack.iter().map(String::as_str).collect();
    path_parts.push(&name);

    Some(VcdSignal {
        id,
        width,
        path: path_parts.join("."),
        name,
        var_type,
    })
}

/// Parse the value section: timestamps and scalar/vector value changes
fn parse_values<'a>(lines: &mut impl Iterator<Item = &'a str>, parsed: &mut ParsedVcd) {
    let mut current_time: SimTime = 0;

    for line in lines {
        let line = line.trim();

        if line.is_empty() || line.starts_with('$') {
            // $dumpvars / $dumpall markers etc. - the value lines between
            // them stand on their own
            continue;
        }

        // Timestamp cursor: #12345
        if let Some(stamp) = line.strip_prefix('#') {
            match stamp.parse::<SimTime>() {
                Ok(t) => current_time = t,
                Err(_) => log::trace!("Skipping malformed timestamp: {line}"),
            }
            continue;
        }

        // Scalar change: value char immediately followed by the ID (no space)
        let first = match line.chars().next() {
            Some(c) => c,
            None => continue,
        };
        if matches!(first, '0' | '1' | 'x' | 'X' | 'z' | 'Z') && line.len() >= 2 {
            if let Ok(value) = first.to_string().parse::<SignalValue>() {
                record_change(parsed, line[1..].trim(), current_time, value);
            }
            continue;
        }

        // Vector change: b1010 ID (space-separated)
        if first == 'b' || first == 'B' {
            let mut parts = line.split_whitespace();
            if let (Some(value_tok), Some(id)) = (parts.next(), parts.next()) {
                if let Ok(value) = value_tok.parse::<SignalValue>() {
                    record_change(parsed, id, current_time, value);
                }
            }
            continue;
        }

        log::trace!("Skipping unrecognized value line: {line}");
    }
}

/// Append a change to a signal's history; unknown IDs are dropped
fn record_change(parsed: &mut ParsedVcd, id: &str, time: SimTime, value: SignalValue) {
    match parsed.changes.get_mut(id) {
        Some(history) => history.push(ValueChange { time, value }),
        None => log::trace!("Dropping change for undeclared signal ID: {id}"),
    }
}
