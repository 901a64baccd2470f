// End-to-end sweeps over a multiplexed DBC catalogue

use can_vector_gen::{
    FrameValueBuilder, GeneratorConfig, MuxResolver, SignalValue, TestVector, ValuePicker,
    VectorGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

fn catalogue_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/multiplexing.dbc")
}

fn loaded_generator() -> VectorGenerator {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut generator = VectorGenerator::new();
    generator.add_dbc(&catalogue_path()).unwrap();
    generator
}

#[test]
fn loads_catalogue() {
    let generator = loaded_generator();
    let stats = generator.database_stats();
    assert_eq!(stats.num_messages, 3);
    assert_eq!(stats.num_signals, 14);
    assert_eq!(stats.num_multiplexed, 1);

    let db = generator.database();
    assert_eq!(db.get_all_can_ids(), vec![0x142, 0x1F0, 0x18FEF1FE]);
    assert!(db.get_message(0x18FEF1FE).unwrap().is_extended);
}

#[test]
fn every_vector_is_page_consistent() {
    let generator = loaded_generator();
    let config = GeneratorConfig::new().with_seed(2024).with_iters_per_signal(20);

    for vector in generator.generate(config) {
        let vector = vector.unwrap();
        let message = generator
            .database()
            .get_message_with_format(vector.can_id, vector.is_extended)
            .unwrap();

        assert!(vector.values.contains(&vector.signal_name));

        match MuxResolver::selector(message) {
            Some(selector) => {
                let page = vector.multiplexer_value.expect("multiplexed frame without page");
                assert!(page == 0 || page == 1, "page {} is not declared", page);
                assert_eq!(
                    vector.values.get(&selector.name),
                    Some(&SignalValue::Integer(page as i64))
                );
                for signal in &message.signals {
                    assert_eq!(
                        vector.values.contains(&signal.name),
                        MuxResolver::is_active(signal, page),
                        "{} on page {}",
                        signal.name,
                        page
                    );
                }
            }
            None => assert_eq!(vector.values.len(), message.signals.len()),
        }
    }
}

#[test]
fn paged_targets_select_their_page() {
    let generator = loaded_generator();
    let vectors: Vec<TestVector> = generator
        .generate(GeneratorConfig::new().with_can_ids(vec![0x142]).with_iters_per_signal(5))
        .collect::<can_vector_gen::Result<_>>()
        .unwrap();

    for vector in &vectors {
        let expected_page = match vector.signal_name.as_str() {
            "open" | "closed" | "direction" | "mode" => Some(0),
            "speed" | "temperature" | "trim" => Some(1),
            _ => None,
        };
        if let Some(page) = expected_page {
            assert_eq!(vector.multiplexer_value, Some(page), "{}", vector.signal_name);
        }
    }
}

#[test]
fn value_tables_drive_picks() {
    let generator = loaded_generator();
    let message = generator.database().get_message(0x142).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    let direction = message.signal("direction").unwrap();
    let trim = message.signal("trim").unwrap();
    for _ in 0..200 {
        match ValuePicker::pick(direction, &mut rng) {
            SignalValue::Integer(v) => assert!((0..=2).contains(&v), "SNA drawn: {}", v),
            other => panic!("unexpected {:?}", other),
        }
        match ValuePicker::pick(trim, &mut rng) {
            SignalValue::Integer(v) => assert!([-1, 0, 1].contains(&v), "unexpected trim {}", v),
            other => panic!("unexpected {:?}", other),
        }
    }

    let state = generator
        .database()
        .get_message_by_name("J1939Status")
        .unwrap()
        .signal("State")
        .unwrap();
    for _ in 0..100 {
        let value = ValuePicker::pick(state, &mut rng);
        assert_ne!(value, SignalValue::Integer(3));
    }
}

#[test]
fn scaled_signals_stay_in_declared_bounds() {
    let generator = loaded_generator();
    let message = generator.database().get_message(0x1F0).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..200 {
        let values =
            FrameValueBuilder::build_for(message, "Enable", SignalValue::Boolean(true), &mut rng)
                .unwrap();

        let radius = values.get("AverageRadius").unwrap().as_f64();
        assert!((0.0..=5.0 + 1e-9).contains(&radius), "radius {}", radius);

        let temperature = values.get("Temperature").unwrap().as_f64();
        assert!(
            (229.52 - 1e-9..=270.47 + 1e-9).contains(&temperature),
            "temperature {}",
            temperature
        );
    }
}

#[test]
fn selector_target_reports_resolved_page() {
    let generator = loaded_generator();
    let message = generator.database().get_message(0x142).unwrap();
    let mut rng = StdRng::seed_from_u64(8);

    let values =
        FrameValueBuilder::build_for(message, "MUX_signal", SignalValue::Integer(2), &mut rng)
            .unwrap();
    let page = values.get("MUX_signal").copied().unwrap();
    assert!(page == SignalValue::Integer(0) || page == SignalValue::Integer(1));
}

#[test]
fn vectors_serialize_to_json() {
    let generator = loaded_generator();
    let vector = generator
        .generate(GeneratorConfig::new().with_can_ids(vec![0x142]))
        .nth(3)
        .unwrap()
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&vector).unwrap();
    assert_eq!(json["can_id"], 0x142);
    assert_eq!(json["message_name"], "MuxFrame");
    assert_eq!(json["signal_name"], "direction");
    assert_eq!(json["values"]["MUX_signal"], 0);
    assert!(json["values"].get("speed").is_none());
}
