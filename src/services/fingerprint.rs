// Fingerprinting Service
// Hash- and n-gram-based signatures over normalized text, used to
// pre-filter candidates cheaply. Deterministic, no I/O. Never used as a
// standalone plagiarism decision.

use crate::models::Fingerprint;
use crate::services::text_processor::normalize;

const NGRAM_WORDS: usize = 5;
const MAX_NGRAMS: usize = 20;

/// FNV-1a, 32-bit.
fn fnv1a(text: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in text.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Compute the content fingerprint: a hash of the normalized text, a
/// hash of its character-reversed form (cheap reorder/tamper signal),
/// and hashes of the first 20 overlapping 5-word n-grams.
pub fn fingerprint(text: &str) -> Fingerprint {
    let normalized = normalize(text);
    let reversed: String = normalized.chars().rev().collect();

    let words: Vec<&str> = normalized.split_whitespace().collect();
    let mut ngram_hashes = Vec::new();
    if words.len() >= NGRAM_WORDS {
        for window in words.windows(NGRAM_WORDS).take(MAX_NGRAMS) {
            ngram_hashes.push(fnv1a(&window.join(" ")));
        }
    }

    Fingerprint {
        primary_hash: fnv1a(&normalized),
        secondary_hash: fnv1a(&reversed),
        ngram_hashes,
    }
}
