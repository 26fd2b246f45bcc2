use super::*;

use rand::{SeedableRng, rngs::StdRng};

#[test]
fn payload_has_ten_unique_well_formed_fields() {
    let mut rng = StdRng::seed_from_u64(7);
    let payload = generate_payload_with(&mut rng, 1000);

    assert_eq!(payload.len(), NUM_FIELDS);

    for (name, value) in &payload {
        let (adjective, scientist) = name.split_once('-').expect("adjective-scientist");
        assert!(ADJECTIVES.contains(&adjective), "unknown adjective in {name}");
        assert!(
            SCIENTISTS.iter().any(|s| s.to_lowercase() == scientist),
            "unknown scientist in {name}"
        );
        assert_eq!(name, &name.to_lowercase());

        let s = value.as_str().expect("string value");
        assert!(!s.is_empty());
        assert!(s.bytes().all(|b| CHARSET.contains(&b)), "bad char in {s}");
    }
}

#[test]
fn field_lengths_stay_within_budget() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1000 {
        let len = field_length(&mut rng, 1000);
        assert!((1..=100).contains(&len), "length {len} out of range");
    }
}

#[test]
fn tiny_budget_still_yields_one_char_fields() {
    let mut rng = StdRng::seed_from_u64(1);
    let payload = generate_payload_with(&mut rng, 0);

    assert!(payload.values().all(|v| v.as_str().map(str::len) == Some(1)));
}

#[test]
fn generated_bytes_are_valid_json_objects() {
    let bytes = generate_json_payload(200);
    let value: Value = serde_json::from_slice(&bytes).expect("valid json");

    assert_eq!(value.as_object().map(Map::len), Some(NUM_FIELDS));
}
