//! Anonymous profile sets and seeded assignment.
//!
//! Participants get anonymous animal profiles so nothing about their real
//! identity leaks into the experiment. Assignment is deterministic per
//! seed string (experiment or cohort id), so a participant keeps the same
//! profile across reloads.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

use crate::types::ParticipantProfile;

pub const PROFILE_SET_ANIMALS_ID: &str = "animals-1";

/// Curated animal profile set (name, emoji avatar).
pub const PROFILE_SET_ANIMALS: &[(&str, &str)] = &[
    ("Bear", "🐻"),
    ("Goose", "🪿"),
    ("Buffalo", "🐃"),
    ("Dog", "🐶"),
    ("Cat", "🐱"),
    ("Badger", "🦡"),
    ("Otter", "🦦"),
    ("Peacock", "🦚"),
    ("Camel", "🐪"),
    ("Squid", "🦑"),
    ("Butterfly", "🦋"),
    ("Lion", "🦁"),
    ("Ram", "🐏"),
    ("Alligator", "🐊"),
    ("Owl", "🦉"),
    ("Iguana", "🦎"),
    ("Dolphin", "🐬"),
    ("Whale", "🐳"),
    ("Duck", "🦆"),
    ("Swan", "🦢"),
    ("Zebra", "🦓"),
    ("Turtle", "🐢"),
    ("Gorilla", "🦍"),
    ("Pig", "🐷"),
    ("Frog", "🐸"),
    ("Hamster", "🐹"),
    ("Kangaroo", "🦘"),
    ("Elephant", "🐘"),
    ("Unicorn", "🦄"),
    ("Bat", "🦇"),
    ("Llama", "🦙"),
    ("Fox", "🦊"),
    ("Tiger", "🐯"),
];

/// Hash a seed string to a 64-bit RNG seed.
fn seed_from_string(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

/// Shuffle a slice deterministically for a given seed string.
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: &str) -> Vec<T> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed_from_string(seed));
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut rng);
    shuffled
}

/// Assign anonymous profiles to `count` participants, shuffled by the
/// seed string. Wraps around (with a numeric suffix) if the cohort is
/// larger than the profile set.
pub fn assign_anonymous_profiles(count: usize, seed: &str) -> Vec<ParticipantProfile> {
    let shuffled = seeded_shuffle(PROFILE_SET_ANIMALS, seed);
    (0..count)
        .map(|i| {
            let (name, avatar) = shuffled[i % shuffled.len()];
            let round = i / shuffled.len();
            let name = if round == 0 {
                name.to_string()
            } else {
                format!("{} {}", name, round + 1)
            };
            ParticipantProfile::new(name, avatar)
        })
        .collect()
}
