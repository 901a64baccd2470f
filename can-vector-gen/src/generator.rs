//! Main generator API
//!
//! This module provides the primary interface for the library. The
//! `VectorGenerator` struct is the entry point for loading signal catalogues
//! and sweeping them into test vectors.

use crate::builder::FrameValueBuilder;
use crate::config::GeneratorConfig;
use crate::mux::MuxResolver;
use crate::picker::ValuePicker;
use crate::signals::{MessageDefinition, SignalDatabase};
use crate::types::{Result, TestVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Decimal places kept on expected values
const EXPECTED_DECIMALS: i32 = 6;

/// The main generator struct - entry point for all generation operations
pub struct VectorGenerator {
    /// Internal signal database (loaded from DBC files)
    signal_db: SignalDatabase,
}

impl VectorGenerator {
    /// Create a new generator instance
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Load a DBC file and add its definitions to the signal database
    ///
    /// # Arguments
    /// * `path` - Path to the DBC file
    ///
    /// # Returns
    /// * `Result<()>` - Ok if loaded successfully, Err if parsing failed
    ///
    /// # Example
    /// ```no_run
    /// use can_vector_gen::VectorGenerator;
    /// use std::path::Path;
    ///
    /// let mut generator = VectorGenerator::new();
    /// generator.add_dbc(Path::new("model3can.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        for message in messages {
            self.signal_db.add_message(message);
        }

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Add definitions from DBC text already in memory
    pub fn add_dbc_str(&mut self, content: &str, source: &str) -> Result<()> {
        let messages = crate::signals::dbc::parse_dbc_str(content, source)?;
        log::info!("Loaded {} messages from {}", messages.len(), source);
        for message in messages {
            self.signal_db.add_message(message);
        }
        Ok(())
    }

    /// Add a single message definition, checking its invariants first
    pub fn add_message(&mut self, message: MessageDefinition) -> Result<()> {
        message.validate()?;
        self.signal_db.add_message(message);
        Ok(())
    }

    /// Read-only access to the loaded catalogue
    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// Sweep the catalogue and return an iterator of test vectors
    ///
    /// Every signal of every selected message becomes the target of
    /// `iters_per_signal` frames. The iterator owns its random source, seeded
    /// from the configuration, so two sweeps with the same seed over the same
    /// catalogue yield the same vectors.
    ///
    /// # Example
    /// ```no_run
    /// use can_vector_gen::{GeneratorConfig, VectorGenerator};
    /// use std::path::Path;
    ///
    /// let mut generator = VectorGenerator::new();
    /// generator.add_dbc(Path::new("model3can.dbc")).unwrap();
    ///
    /// for vector in generator.generate(GeneratorConfig::new().with_seed(42)) {
    ///     match vector {
    ///         Ok(v) => println!("{} {} = {}", v.message_name, v.signal_name, v.expected),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn generate(&self, config: GeneratorConfig) -> VectorIterator<'_> {
        let messages: Vec<&MessageDefinition> = self
            .signal_db
            .messages()
            .into_iter()
            .filter(|m| config.should_process_message(m.id))
            .collect();

        log::debug!(
            "Sweeping {} messages with seed {}",
            messages.len(),
            config.seed
        );

        VectorIterator {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            messages,
            msg_idx: 0,
            sig_idx: 0,
            iter_idx: 0,
            tested: 0,
        }
    }
}

impl Default for VectorGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that turns a catalogue into test vectors
///
/// Walks messages in ascending CAN ID order and their signals in catalogue
/// order. For each target signal it draws a candidate value, builds a full
/// assignment around it and emits the result.
pub struct VectorIterator<'a> {
    rng: StdRng,
    config: GeneratorConfig,
    messages: Vec<&'a MessageDefinition>,
    msg_idx: usize,
    sig_idx: usize,
    iter_idx: usize,
    tested: usize,
}

impl<'a> VectorIterator<'a> {
    /// Number of distinct target signals covered so far
    pub fn signals_covered(&self) -> usize {
        self.tested
    }

    fn advance(&mut self) {
        self.iter_idx += 1;
        if self.iter_idx >= self.config.iterations() {
            self.iter_idx = 0;
            self.sig_idx += 1;
            self.tested += 1;
        }
    }
}

impl<'a> Iterator for VectorIterator<'a> {
    type Item = Result<TestVector>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let message = *self.messages.get(self.msg_idx)?;

            let Some(signal) = message.signals.get(self.sig_idx) else {
                self.msg_idx += 1;
                self.sig_idx = 0;
                continue;
            };

            if self.iter_idx == 0 && self.config.signal_limit_reached(self.tested) {
                log::debug!("Signal limit {} reached", self.config.max_signals);
                return None;
            }

            let candidate = ValuePicker::candidate_for(message, signal, &mut self.rng);
            self.advance();

            let values = match FrameValueBuilder::build(message, signal, candidate, &mut self.rng) {
                Ok(values) => values,
                Err(e) => return Some(Err(e)),
            };

            let expected = values
                .get(&signal.name)
                .copied()
                .unwrap_or(candidate)
                .normalize(EXPECTED_DECIMALS);

            let multiplexer_value = MuxResolver::selector(message)
                .and_then(|selector| values.get(&selector.name))
                .and_then(|v| v.as_u64());

            return Some(Ok(TestVector {
                can_id: message.id,
                is_extended: message.is_extended,
                message_name: message.name.clone(),
                signal_name: signal.name.clone(),
                expected,
                multiplexer_value,
                values,
            }));
        }
    }
}

// Re-export DatabaseStats for public API
pub use crate::signals::DatabaseStats;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalDefinition;
    use crate::types::SignalValue;

    fn generator() -> VectorGenerator {
        let mut generator = VectorGenerator::new();
        generator
            .add_message(MessageDefinition {
                id: 0x142,
                name: "MuxMsg".to_string(),
                is_extended: false,
                size: 8,
                sender: None,
                signals: vec![
                    SignalDefinition::new("MUX_signal", 8).as_multiplexer(),
                    SignalDefinition::new("open", 1).with_pages([0]),
                    SignalDefinition::new("speed", 10)
                        .signed()
                        .with_scaling(0.1, 0.0)
                        .with_pages([1]),
                ],
                source: "test".to_string(),
            })
            .unwrap();
        generator
            .add_message(MessageDefinition {
                id: 0x100,
                name: "Status".to_string(),
                is_extended: true,
                size: 8,
                sender: None,
                signals: vec![SignalDefinition::new("Level", 8)],
                source: "test".to_string(),
            })
            .unwrap();
        generator
    }

    #[test]
    fn test_generator_creation() {
        let generator = VectorGenerator::new();
        let stats = generator.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert_eq!(generator.generate(GeneratorConfig::new()).count(), 0);
    }

    #[test]
    fn test_sweep_covers_every_signal_in_id_order() {
        let generator = generator();
        let vectors: Vec<TestVector> = generator
            .generate(GeneratorConfig::new())
            .collect::<Result<_>>()
            .unwrap();

        let targets: Vec<(u32, &str)> = vectors
            .iter()
            .map(|v| (v.can_id, v.signal_name.as_str()))
            .collect();
        assert_eq!(
            targets,
            vec![
                (0x100, "Level"),
                (0x142, "MUX_signal"),
                (0x142, "open"),
                (0x142, "speed"),
            ]
        );
        assert!(vectors[0].is_extended);
        assert_eq!(vectors[0].multiplexer_value, None);
        assert_eq!(vectors[2].multiplexer_value, Some(0));
        assert_eq!(vectors[3].multiplexer_value, Some(1));
        assert!(!vectors[3].values.contains("open"));
    }

    #[test]
    fn test_expected_matches_assignment() {
        let generator = generator();
        for vector in generator.generate(GeneratorConfig::new().with_iters_per_signal(5)) {
            let vector = vector.unwrap();
            let assigned = vector.values.get(&vector.signal_name).copied().unwrap();
            assert_eq!(vector.expected, assigned.normalize(6));
        }
    }

    #[test]
    fn test_iterations_and_signal_limit() {
        let generator = generator();
        let config = GeneratorConfig::new().with_iters_per_signal(3).with_max_signals(2);
        let mut iter = generator.generate(config);
        let count = iter.by_ref().count();
        assert_eq!(count, 6);
        assert_eq!(iter.signals_covered(), 2);
    }

    #[test]
    fn test_can_id_filter() {
        let generator = generator();
        let vectors: Vec<TestVector> = generator
            .generate(GeneratorConfig::new().with_can_ids(vec![0x142]))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.message_name == "MuxMsg"));
    }

    #[test]
    fn test_same_seed_same_vectors() {
        let generator = generator();
        let a: Vec<TestVector> = generator
            .generate(GeneratorConfig::new().with_seed(9).with_iters_per_signal(4))
            .collect::<Result<_>>()
            .unwrap();
        let b: Vec<TestVector> = generator
            .generate(GeneratorConfig::new().with_seed(9).with_iters_per_signal(4))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selector_target_expected_is_a_page() {
        let generator = generator();
        for vector in generator.generate(GeneratorConfig::new().with_iters_per_signal(10)) {
            let vector = vector.unwrap();
            if vector.signal_name == "MUX_signal" {
                assert!(
                    vector.expected == SignalValue::Integer(0)
                        || vector.expected == SignalValue::Integer(1)
                );
            }
        }
    }

    #[test]
    fn test_wide_selector_page_is_reported() {
        let mut generator = VectorGenerator::new();
        generator
            .add_message(MessageDefinition {
                id: 0x300,
                name: "WideMux".to_string(),
                is_extended: false,
                size: 16,
                sender: None,
                signals: vec![
                    SignalDefinition::new("Mux", 64).as_multiplexer(),
                    SignalDefinition::new("Low", 8).with_pages([0]),
                    SignalDefinition::new("High", 8).with_pages([u64::MAX - 1]),
                ],
                source: "test".to_string(),
            })
            .unwrap();

        let high = generator
            .generate(GeneratorConfig::new())
            .map(|v| v.unwrap())
            .find(|v| v.signal_name == "High")
            .unwrap();
        assert_eq!(high.multiplexer_value, Some(u64::MAX - 1));
    }

    #[test]
    fn test_standard_and_extended_frames_are_both_swept() {
        let dbc = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_

BS_:

BU_: ECU1 ECU2

BO_ 256 StdMsg: 8 ECU1
 SG_ StdLevel : 0|8@1+ (1,0) [0|250] "" ECU2

BO_ 2147483904 ExtMsg: 8 ECU1
 SG_ ExtLevel : 0|8@1+ (1,0) [0|250] "" ECU2
"#;
        let mut generator = VectorGenerator::new();
        generator.add_dbc_str(dbc, "frames.dbc").unwrap();
        assert_eq!(generator.database_stats().num_messages, 2);

        let swept: Vec<(String, bool)> = generator
            .generate(GeneratorConfig::new().with_can_ids(vec![0x100]))
            .map(|v| v.unwrap())
            .map(|v| (v.message_name, v.is_extended))
            .collect();
        assert_eq!(
            swept,
            vec![("StdMsg".to_string(), false), ("ExtMsg".to_string(), true)]
        );
    }

    #[test]
    fn test_add_message_rejects_invalid_schema() {
        let mut generator = VectorGenerator::new();
        let result = generator.add_message(MessageDefinition {
            id: 0x1,
            name: "Bad".to_string(),
            is_extended: false,
            size: 8,
            sender: None,
            signals: vec![
                SignalDefinition::new("M1", 2).as_multiplexer(),
                SignalDefinition::new("M2", 2).as_multiplexer(),
            ],
            source: "test".to_string(),
        });
        assert!(result.is_err());
        assert_eq!(generator.database_stats().num_messages, 0);
    }
}
