// Lexical Comparator
// String- and word-set similarity channels. The set-based channels
// (Jaccard, overlap, n-gram) are order-independent; the edit-distance
// ratio is order-sensitive by design so transpositions score lower.

use crate::services::text_processor::{normalize, segment_sentences, tokenize};
use std::collections::HashSet;

/// Levenshtein distance over chars, two-row DP.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit-distance ratio over normalized text: 1 - distance / max(len).
/// Two empty strings are identical (1.0).
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let na: Vec<char> = normalize(a).chars().collect();
    let nb: Vec<char> = normalize(b).chars().collect();
    let max_len = na.len().max(nb.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&na, &nb) as f64 / max_len as f64
}

fn word_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// |A ∩ B| / |A ∪ B| over word sets.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let sa = word_set(a);
    let sb = word_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// |A ∩ B| / min(|A|, |B|) over word sets.
pub fn overlap_coefficient(a: &str, b: &str) -> f64 {
    let sa = word_set(a);
    let sb = word_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let min_len = sa.len().min(sb.len());
    if min_len == 0 {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count();
    intersection as f64 / min_len as f64
}

fn word_ngrams(text: &str, n: usize) -> HashSet<String> {
    let words = tokenize(text);
    if words.len() < n {
        return HashSet::new();
    }
    words.windows(n).map(|w| w.join(" ")).collect()
}

/// Jaccard over n-word shingles (3-word by default in the pipeline).
pub fn ngram_similarity(a: &str, b: &str, n: usize) -> f64 {
    let sa = word_ngrams(a, n);
    let sb = word_ngrams(b, n);
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Document-level lexical channel: mean of word-set Jaccard and overlap.
pub fn document_lexical_score(a: &str, b: &str) -> f64 {
    (jaccard_similarity(a, b) + overlap_coefficient(a, b)) / 2.0
}

/// Document-level structural channel: mean of (a) normalized closeness
/// of average sentence length and (b) Jaccard of sentence-starting words.
pub fn structural_similarity(a: &str, b: &str) -> f64 {
    let sents_a = segment_sentences(a, 1, 0);
    let sents_b = segment_sentences(b, 1, 0);
    if sents_a.is_empty() || sents_b.is_empty() {
        return 0.0;
    }

    let avg_len = |sents: &[crate::models::Segment]| {
        sents
            .iter()
            .map(|s| s.text.split_whitespace().count())
            .sum::<usize>() as f64
            / sents.len() as f64
    };
    let len_a = avg_len(&sents_a);
    let len_b = avg_len(&sents_b);
    let max_len = len_a.max(len_b);
    let length_score = if max_len > 0.0 {
        1.0 - (len_a - len_b).abs() / max_len
    } else {
        0.0
    };

    let starters = |sents: &[crate::models::Segment]| -> HashSet<String> {
        sents
            .iter()
            .filter_map(|s| tokenize(&s.text).into_iter().next())
            .collect()
    };
    let sa = starters(&sents_a);
    let sb = starters(&sents_b);
    let union = sa.union(&sb).count();
    let starter_score = if union > 0 {
        sa.intersection(&sb).count() as f64 / union as f64
    } else {
        0.0
    };

    (length_score + starter_score) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_similarity_identical() {
        assert!((string_similarity("Same sentence here.", "same sentence here") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_string_similarity_symmetric() {
        let a = "the experiment concluded early";
        let b = "the experiment finished late";
        assert!((string_similarity(a, b) - string_similarity(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_string_similarity_order_sensitive() {
        // Same word set, different order: set channels say 1.0, the
        // edit-distance ratio must score lower.
        let a = "alpha beta gamma delta";
        let b = "delta gamma beta alpha";
        assert!((jaccard_similarity(a, b) - 1.0).abs() < 1e-9);
        assert!(string_similarity(a, b) < 0.9);
    }

    #[test]
    fn test_string_similarity_empty_pair() {
        assert_eq!(string_similarity("", ""), 1.0);
        assert!(string_similarity("something", "") < 1e-9);
    }

    #[test]
    fn test_jaccard_known_value() {
        // {a b c} vs {b c d}: 2 shared, 4 union.
        assert!((jaccard_similarity("a b c", "b c d") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a = "winter storms arrived early this year";
        let b = "storms arrived late in the winter";
        assert!((jaccard_similarity(a, b) - jaccard_similarity(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_uses_smaller_set() {
        // {a b} ⊂ {a b c d}: overlap is 1.0 even though Jaccard is 0.5.
        assert!((overlap_coefficient("a b", "a b c d") - 1.0).abs() < 1e-9);
        assert!((jaccard_similarity("a b", "a b c d") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ngram_similarity() {
        let a = "the quick brown fox jumps";
        let b = "the quick brown fox sleeps";
        // 3-grams: a has 3, b has 3, shared 2 ("the quick brown", "quick brown fox").
        assert!((ngram_similarity(a, b, 3) - 0.5).abs() < 1e-9);
        assert!((ngram_similarity(a, b, 3) - ngram_similarity(b, a, 3)).abs() < 1e-12);
    }

    #[test]
    fn test_ngram_similarity_short_text() {
        assert_eq!(ngram_similarity("too short", "too short", 3), 0.0);
    }

    #[test]
    fn test_structural_similarity_identical_docs() {
        let doc = "The first sentence is here. The second sentence follows it.";
        assert!((structural_similarity(doc, doc) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_structural_similarity_empty() {
        assert_eq!(structural_similarity("", "anything at all"), 0.0);
    }
}
