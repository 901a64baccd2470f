//! Core types for the CAN test-vector generator
//!
//! This module defines the values the generator emits. Assignments are built
//! fresh for every generation call and handed to an external frame encoder;
//! nothing here keeps state between calls.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that can occur while loading schemas or building assignments
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Message not found: CAN ID 0x{0:X}")]
    MessageNotFound(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Scalar value assigned to one signal
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Boolean value (single-bit flags)
    Boolean(bool),
    /// Integer value (unscaled signals, selector pages)
    Integer(i64),
    /// Unsigned value above `i64::MAX` (wide selector pages)
    Unsigned(u64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Unsigned(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}

impl SignalValue {
    /// Selector page as a value: `Integer` when it fits in `i64`, else `Unsigned`
    pub fn from_page(page: u64) -> Self {
        i64::try_from(page).map_or(SignalValue::Unsigned(page), SignalValue::Integer)
    }

    /// Convert signal value to f64
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Integer(v) => *v as f64,
            SignalValue::Unsigned(v) => *v as f64,
            SignalValue::Float(v) => *v,
            SignalValue::Boolean(v) => if *v { 1.0 } else { 0.0 },
        }
    }

    /// Convert signal value to i64 if it holds an integral quantity
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SignalValue::Integer(v) => Some(*v),
            SignalValue::Unsigned(v) => i64::try_from(*v).ok(),
            SignalValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            SignalValue::Float(_) => None,
            SignalValue::Boolean(v) => Some(if *v { 1 } else { 0 }),
        }
    }

    /// Non-negative integral value as u64 (selector pages)
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SignalValue::Unsigned(v) => Some(*v),
            other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// Check if this is a boolean value
    pub fn is_boolean(&self) -> bool {
        matches!(self, SignalValue::Boolean(_))
    }

    /// Round floats to `ndigits` decimals so values compare stably after a
    /// decode round trip. Integers and booleans are returned unchanged.
    pub fn normalize(self, ndigits: i32) -> SignalValue {
        match self {
            SignalValue::Float(v) => SignalValue::Float(round_to(v, ndigits)),
            other => other,
        }
    }
}

impl From<bool> for SignalValue {
    fn from(v: bool) -> Self {
        SignalValue::Boolean(v)
    }
}

impl From<i64> for SignalValue {
    fn from(v: i64) -> Self {
        SignalValue::Integer(v)
    }
}

impl From<f64> for SignalValue {
    fn from(v: f64) -> Self {
        SignalValue::Float(v)
    }
}

/// Round `value` to `ndigits` decimal places
pub(crate) fn round_to(value: f64, ndigits: i32) -> f64 {
    let factor = 10f64.powi(ndigits);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Mapping from signal name to the value placed on it for one frame.
///
/// Entries keep the order in which they were assigned, which follows the
/// message's signal order with the selector first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueAssignment {
    entries: Vec<(String, SignalValue)>,
    /// Position of each name in `entries`
    index: HashMap<String, usize>,
}

impl ValueAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value, replacing any previous value for the same signal
    pub fn insert(&mut self, name: impl Into<String>, value: SignalValue) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = value,
            None => self.push(name, value),
        }
    }

    /// Assign a value only if the signal has none yet
    pub fn insert_default(&mut self, name: &str, value: impl FnOnce() -> SignalValue) {
        if !self.contains(name) {
            self.push(name.to_string(), value());
        }
    }

    pub fn get(&self, name: &str) -> Option<&SignalValue> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Signal names in assignment order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    fn push(&mut self, name: String, value: SignalValue) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
    }
}

impl Serialize for ValueAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One generated test case: a full assignment for a message, built around a
/// single target signal whose decoded value the test expects to observe.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TestVector {
    /// CAN message ID (without the extended-frame flag)
    pub can_id: u32,
    /// True if the frame uses a 29-bit identifier
    pub is_extended: bool,
    /// Message name from the catalogue
    pub message_name: String,
    /// Signal under test
    pub signal_name: String,
    /// Final value of the target signal, floats rounded to 6 decimals
    pub expected: SignalValue,
    /// Active multiplexer page, if the message is multiplexed
    pub multiplexer_value: Option<u64>,
    /// Complete assignment to hand to the frame encoder
    pub values: ValueAssignment,
}
