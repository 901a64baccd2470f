//! Unified signal database
//!
//! Combines message definitions from one or more DBC files into a single
//! queryable, read-only catalogue. Definitions are immutable once added.

use crate::types::{GeneratorError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// CAN message ID (11-bit or 29-bit, extended flag stripped)
    pub id: u32,
    /// Message name
    pub name: String,
    /// True if this message uses a 29-bit identifier
    pub is_extended: bool,
    /// Message size in bytes
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// All signals in this message, in catalogue order
    pub signals: Vec<SignalDefinition>,
    /// Source file (DBC filename)
    pub source: String,
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Length in bits
    pub length: u16,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Declared minimum physical value
    pub min: Option<f64>,
    /// Declared maximum physical value
    pub max: Option<f64>,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: Option<String>,
    /// Enumerated values (raw value -> label)
    pub choices: Option<BTreeMap<i64, String>>,
    /// Selector values for which this signal is present
    pub multiplexer_ids: Option<BTreeSet<u64>>,
    /// True for the message's selector signal
    pub is_multiplexer: bool,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

impl SignalDefinition {
    /// Plain unsigned signal with unit scaling and no bounds, choices or pages
    pub fn new(name: impl Into<String>, length: u16) -> Self {
        Self {
            name: name.into(),
            length,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: None,
            max: None,
            unit: None,
            choices: None,
            multiplexer_ids: None,
            is_multiplexer: false,
        }
    }

    pub fn signed(mut self) -> Self {
        self.value_type = ValueType::Signed;
        self
    }

    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(|(k, v)| (k, v.into())).collect());
        self
    }

    pub fn with_pages<I: IntoIterator<Item = u64>>(mut self, pages: I) -> Self {
        self.multiplexer_ids = Some(pages.into_iter().collect());
        self
    }

    pub fn as_multiplexer(mut self) -> Self {
        self.is_multiplexer = true;
        self
    }

    pub fn is_signed(&self) -> bool {
        self.value_type == ValueType::Signed
    }

    /// Enumerated values, if any are declared
    pub fn choices(&self) -> Option<&BTreeMap<i64, String>> {
        self.choices.as_ref().filter(|c| !c.is_empty())
    }

    /// Page set, if the signal is gated by the selector
    pub fn pages(&self) -> Option<&BTreeSet<u64>> {
        self.multiplexer_ids.as_ref().filter(|p| !p.is_empty())
    }
}

impl MessageDefinition {
    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// True if this message carries a selector or page-gated signals
    pub fn is_multiplexed(&self) -> bool {
        self.signals
            .iter()
            .any(|s| s.is_multiplexer || s.pages().is_some())
    }

    /// Check the structural invariants the generator relies on: unique signal
    /// names, non-zero bit lengths, at most one selector, and no page set on
    /// the selector itself.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut selectors = 0;

        for signal in &self.signals {
            if !seen.insert(signal.name.as_str()) {
                return Err(GeneratorError::InvalidSchema(format!(
                    "Duplicate signal '{}' in message '{}'",
                    signal.name, self.name
                )));
            }
            if signal.length == 0 || signal.length > 64 {
                return Err(GeneratorError::InvalidSchema(format!(
                    "Signal '{}' in message '{}' has unsupported bit length {}",
                    signal.name, self.name, signal.length
                )));
            }
            if signal.is_multiplexer {
                selectors += 1;
                if signal.pages().is_some() {
                    return Err(GeneratorError::InvalidSchema(format!(
                        "Selector '{}' in message '{}' must not declare pages",
                        signal.name, self.name
                    )));
                }
            }
        }

        if selectors > 1 {
            return Err(GeneratorError::InvalidSchema(format!(
                "Message '{}' has {} selector signals",
                self.name, selectors
            )));
        }

        Ok(())
    }
}

/// Database key: standard and extended frames with the same ID are distinct
type MessageKey = (u32, bool);

/// The unified signal database
pub struct SignalDatabase {
    /// All message definitions by (CAN ID, extended flag)
    messages: HashMap<MessageKey, MessageDefinition>,

    /// Message name lookup
    /// Key: Message name, Value: database key
    message_lookup: HashMap<String, MessageKey>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self {
            messages: HashMap::new(),
            message_lookup: HashMap::new(),
        }
    }

    /// Add a message definition to the database.
    ///
    /// A message with the same CAN ID and frame format as an existing one
    /// replaces it.
    pub fn add_message(&mut self, message: MessageDefinition) {
        let key = (message.id, message.is_extended);

        if let Some(previous) = self.messages.get(&key) {
            log::warn!(
                "Message 0x{:X} '{}' from {} replaces '{}' from {}",
                message.id,
                message.name,
                message.source,
                previous.name,
                previous.source
            );
            self.message_lookup.remove(&previous.name);
        }

        self.message_lookup.insert(message.name.clone(), key);
        self.messages.insert(key, message);
    }

    /// Get a message definition by CAN ID, preferring the standard frame
    /// when both formats share the ID
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages
            .get(&(can_id, false))
            .or_else(|| self.messages.get(&(can_id, true)))
    }

    /// Get a message definition by CAN ID and frame format
    pub fn get_message_with_format(
        &self,
        can_id: u32,
        is_extended: bool,
    ) -> Option<&MessageDefinition> {
        self.messages.get(&(can_id, is_extended))
    }

    /// Get message definition by name
    pub fn get_message_by_name(&self, message_name: &str) -> Option<&MessageDefinition> {
        self.message_lookup
            .get(message_name)
            .and_then(|key| self.messages.get(key))
    }

    /// All messages in ascending CAN ID order, standard before extended
    pub fn messages(&self) -> Vec<&MessageDefinition> {
        let mut keys: Vec<&MessageKey> = self.messages.keys().collect();
        keys.sort_unstable();
        keys.into_iter()
            .filter_map(|key| self.messages.get(key))
            .collect()
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let num_messages = self.messages.len();
        let num_signals: usize = self.messages.values().map(|msg| msg.signals.len()).sum();
        let num_multiplexed = self.messages.values().filter(|msg| msg.is_multiplexed()).count();

        DatabaseStats {
            num_messages,
            num_signals,
            num_multiplexed,
        }
    }

    /// Get all distinct CAN IDs in the database, sorted. An ID used by both a
    /// standard and an extended frame appears once.
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.messages.keys().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Messages with a selector or page-gated signals
    pub num_multiplexed: usize,
}

impl Default for SignalDatabase {
    fn default() -> Self {
        Self::new()
    }
}
