use rand::{Rng, seq::SliceRandom};
use serde_json::{Map, Value};

pub const NUM_FIELDS: usize = 10;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ123456789";

const ADJECTIVES: &[&str] = &[
    "curious",
    "brilliant",
    "eccentric",
    "visionary",
    "persistent",
    "innovative",
    "meticulous",
    "logical",
    "analytical",
    "creative",
    "theoretical",
    "practical",
    "quantum",
    "relativistic",
    "molecular",
    "astute",
    "pioneering",
    "dedicated",
    "revolutionary",
    "insightful",
];

const SCIENTISTS: &[&str] = &[
    "Einstein",
    "Newton",
    "Curie",
    "Darwin",
    "Tesla",
    "Bohr",
    "Hawking",
    "Feynman",
    "Lovelace",
    "Turing",
    "Hopper",
    "Heisenberg",
    "Schrodinger",
    "Goodall",
    "Meitner",
    "Fermi",
    "Planck",
    "Franklin",
    "Faraday",
    "Maxwell",
];

/// Length of one field value: the payload budget split across all fields,
/// scaled by a uniform random factor, never below 1.
fn field_length<R: Rng + ?Sized>(rng: &mut R, max_payload_size: usize) -> usize {
    let x = rng.r#gen::<f64>() * max_payload_size as f64;
    ((x / NUM_FIELDS as f64) as usize).max(1)
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// `<adjective>-<scientist>`, lowercased.
fn field_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("curious");
    let scientist = SCIENTISTS.choose(rng).copied().unwrap_or("Curie");
    format!("{adjective}-{scientist}").to_lowercase()
}

pub fn generate_payload_with<R: Rng + ?Sized>(
    rng: &mut R,
    max_payload_size: usize,
) -> Map<String, Value> {
    let mut payload = Map::with_capacity(NUM_FIELDS);

    while payload.len() < NUM_FIELDS {
        let name = field_name(rng);
        if payload.contains_key(&name) {
            continue;
        }

        let length = field_length(rng, max_payload_size);
        payload.insert(name, Value::String(random_string(rng, length)));
    }

    payload
}

/// Serialized JSON object with [`NUM_FIELDS`] uniquely named random string
/// fields, sized against `max_payload_size`.
pub fn generate_json_payload(max_payload_size: usize) -> Vec<u8> {
    let payload = generate_payload_with(&mut rand::thread_rng(), max_payload_size);
    // A map of strings always serializes.
    serde_json::to_vec(&Value::Object(payload)).unwrap_or_default()
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
