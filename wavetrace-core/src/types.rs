//! Core types for the waveform trace library
//!
//! This module defines the fundamental types shared by the waveform store and
//! the netlist graph: simulation time, four-state signal values, and the
//! library error type. The engines are stateless after load and only answer
//! queries - they do not simulate logic or mutate loaded state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Simulation time in timescale units.
///
/// Parsed timestamps are always non-negative, but queries may pass negative
/// times (which precede every recorded change and therefore resolve to
/// "unknown").
pub type SimTime = i64;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Errors that can occur while loading waveform or netlist artifacts
///
/// Not-found conditions (unknown signal, unknown module, undriven net, no
/// value at a requested time) are deliberately NOT errors - they are
/// represented as `Option`/empty results so report building can render
/// "not found" instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Failed to parse VCD file: {0}")]
    VcdParseError(String),

    #[error("Failed to parse netlist file: {0}")]
    NetlistParseError(String),

    #[error("Netlist contains no modules")]
    EmptyNetlist,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single four-state logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    Zero,
    One,
    /// Unknown / don't-care
    X,
    /// High impedance
    Z,
}

impl Logic {
    /// Parse a scalar value character as it appears in a VCD value line
    pub fn from_char(c: char) -> Option<Logic> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "x"),
            Logic::Z => write!(f, "z"),
        }
    }
}

/// A signal value as recorded in the waveform
///
/// Scalars come from single-character value lines (`0!`), vectors from
/// `b`-prefixed binary literals (`b1010 "`). Vector payloads keep the raw
/// digit string so `x`/`z` bits survive unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalValue {
    Scalar(Logic),
    Vector(String),
}

impl SignalValue {
    /// True when the value contains any unknown (`x`) or high-impedance
    /// (`z`) bits.
    pub fn is_unknown(&self) -> bool {
        match self {
            SignalValue::Scalar(l) => matches!(l, Logic::X | Logic::Z),
            SignalValue::Vector(bits) => {
                bits.chars().any(|c| matches!(c, 'x' | 'X' | 'z' | 'Z'))
            }
        }
    }

    /// Interpret the value as an unsigned integer, if every bit is defined
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SignalValue::Scalar(Logic::Zero) => Some(0),
            SignalValue::Scalar(Logic::One) => Some(1),
            SignalValue::Scalar(_) => None,
            SignalValue::Vector(bits) => u64::from_str_radix(bits, 2).ok(),
        }
    }
}

impl FromStr for SignalValue {
    type Err = TraceError;

    /// Parse a value token: a single scalar character, or a binary vector
    /// literal with a `b`/`B` prefix.
    fn from_str(s: &str) -> Result<SignalValue> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Logic::from_char(c)
                .map(SignalValue::Scalar)
                .ok_or_else(|| TraceError::VcdParseError(format!("bad scalar value: {s}"))),
            (Some('b') | Some('B'), Some(_)) => Ok(SignalValue::Vector(s[1..].to_string())),
            _ => Err(TraceError::VcdParseError(format!("bad value token: {s}"))),
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Scalar(l) => write!(f, "{}", l),
            SignalValue::Vector(bits) => write!(f, "b{}", bits),
        }
    }
}
