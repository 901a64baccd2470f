//! DBC file parser
//!
//! Parses Vector DBC files and converts them into our internal signal database
//! format, including value tables and simple/extended multiplexing.

use crate::signals::database::{MessageDefinition, SignalDefinition, ValueType};
use crate::types::{GeneratorError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Bit 31 of a DBC message ID marks a 29-bit identifier
const EXTENDED_ID_FLAG: u32 = 0x8000_0000;

/// Upper bound on pages expanded from a single `SG_MUL_VAL_` range
const MAX_PAGES_PER_RANGE: u64 = 4096;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        GeneratorError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Try UTF-8 first, then fallback to Latin-1/Windows-1252 encoding
    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc")
        .to_string();

    let messages = parse_dbc_str(&dbc_content, &source_filename)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC text that is already in memory
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        GeneratorError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    let extended_pages = collect_extended_pages(&dbc);

    dbc.messages()
        .iter()
        .map(|dbc_msg| convert_message(&dbc, dbc_msg, &extended_pages, source))
        .collect()
}

/// Pages declared through `SG_MUL_VAL_`, keyed by (raw message ID, signal name)
fn collect_extended_pages(dbc: &can_dbc::DBC) -> HashMap<(u32, String), BTreeSet<u64>> {
    let mut pages: HashMap<(u32, String), BTreeSet<u64>> = HashMap::new();

    for ext in dbc.extended_multiplex() {
        let entry = pages
            .entry((ext.message_id().0, ext.signal_name().to_string()))
            .or_default();

        for mapping in ext.mappings() {
            let (lo, hi) = (*mapping.min_value(), *mapping.max_value());
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if hi - lo >= MAX_PAGES_PER_RANGE {
                log::warn!(
                    "Multiplexer range {}..={} for '{}' truncated to {} pages",
                    lo,
                    hi,
                    ext.signal_name(),
                    MAX_PAGES_PER_RANGE
                );
            }
            let hi = hi.min(lo.saturating_add(MAX_PAGES_PER_RANGE - 1));
            entry.extend(lo..=hi);
        }
    }

    pages
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    extended_pages: &HashMap<(u32, String), BTreeSet<u64>>,
    source: &str,
) -> Result<MessageDefinition> {
    let raw_id = dbc_msg.message_id().0;

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            let choices = dbc
                .value_descriptions_for_signal(can_dbc::MessageId(raw_id), dbc_sig.name())
                .map(|descriptions| convert_value_descriptions(dbc_sig.name(), descriptions));
            let pages = extended_pages.get(&(raw_id, dbc_sig.name().to_string()));
            convert_signal(dbc_sig, choices, pages)
        })
        .collect::<Result<Vec<_>>>()?;

    let message = MessageDefinition {
        id: raw_id & !EXTENDED_ID_FLAG,
        name: dbc_msg.message_name().to_string(),
        is_extended: raw_id & EXTENDED_ID_FLAG != 0,
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        source: source.to_string(),
    };

    message.validate()?;
    Ok(message)
}

/// Value-table keys that are not whole numbers in `i64` range are dropped
fn convert_value_descriptions(
    signal_name: &str,
    descriptions: &[can_dbc::ValDescription],
) -> BTreeMap<i64, String> {
    descriptions
        .iter()
        .filter_map(|d| {
            let raw = *d.a();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            if raw.fract() != 0.0 || raw < i64::MIN as f64 || raw >= i64::MAX as f64 {
                log::warn!(
                    "Dropping value-table entry {} \"{}\" of '{}': key is not representable",
                    raw,
                    d.b(),
                    signal_name
                );
                return None;
            }
            Some((raw as i64, d.b().to_string()))
        })
        .collect()
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    choices: Option<BTreeMap<i64, String>>,
    extended_pages: Option<&BTreeSet<u64>>,
) -> Result<SignalDefinition> {
    let length = u16::try_from(*dbc_sig.signal_size()).map_err(|_| {
        GeneratorError::InvalidSchema(format!(
            "Signal '{}' has unsupported bit length {}",
            dbc_sig.name(),
            dbc_sig.signal_size()
        ))
    })?;

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let (is_multiplexer, multiplexer_ids) = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Multiplexor => (true, None),
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => (
            false,
            Some(
                extended_pages
                    .cloned()
                    .unwrap_or_else(|| BTreeSet::from([switch_value])),
            ),
        ),
        can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(switch_value) => {
            // Nested multiplexing: only the outer selector drives pages.
            log::warn!(
                "Signal '{}' is a nested multiplexer; treating it as a plain signal on page {}",
                dbc_sig.name(),
                switch_value
            );
            (
                false,
                Some(
                    extended_pages
                        .cloned()
                        .unwrap_or_else(|| BTreeSet::from([switch_value])),
                ),
            )
        }
        can_dbc::MultiplexIndicator::Plain => (false, None),
    };

    // [0|0] is the DBC convention for "no declared range"
    let (min, max) = if *dbc_sig.min() == 0.0 && *dbc_sig.max() == 0.0 {
        (None, None)
    } else {
        (Some(*dbc_sig.min()), Some(*dbc_sig.max()))
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        length,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min,
        max,
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        choices: choices.filter(|c| !c.is_empty()),
        multiplexer_ids,
        is_multiplexer,
    })
}
