// Stylometric Analyzer
// Per-segment writing-style profiles (lexical diversity, sentence
// length, punctuation and POS-rate approximations, readability) and a
// style-shift detector across a document's paragraphs.

use crate::models::{ShiftSeverity, StyleAnalysis, StyleProfile, StyleShift, ThresholdConfig};
use crate::services::text_processor::{segment_paragraphs, segment_sentences, tokenize};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const ADJECTIVE_SUFFIXES: [&str; 8] = ["ous", "ful", "ive", "able", "ible", "ant", "ent", "ic"];
const VERB_SUFFIXES: [&str; 4] = ["ing", "ed", "ize", "ate"];
const NOUN_SUFFIXES: [&str; 6] = ["tion", "sion", "ment", "ness", "ity", "ism"];

/// Approximate syllable count: strip silent suffixes, count vowel
/// groups, floor of one syllable per word.
pub fn count_syllables(word: &str) -> usize {
    let w = word.to_lowercase();
    let w = w.trim_matches(|c: char| !c.is_alphabetic());
    if w.is_empty() {
        return 1;
    }

    let stripped = w
        .strip_suffix("es")
        .or_else(|| w.strip_suffix("ed"))
        .or_else(|| w.strip_suffix('e'))
        .unwrap_or(w);

    let mut groups = 0usize;
    let mut in_vowel = false;
    for ch in stripped.chars() {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !in_vowel {
            groups += 1;
        }
        in_vowel = is_vowel;
    }

    groups.max(1)
}

/// Flesch-Kincaid-style reading ease:
/// 206.835 - 1.015 * wordsPerSentence - 84.6 * (syllables / words)
fn readability(avg_words_per_sentence: f64, syllables: usize, words: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    206.835 - 1.015 * avg_words_per_sentence - 84.6 * (syllables as f64 / words as f64)
}

fn suffix_rate(tokens: &[String], suffixes: &[&str]) -> f64 {
    let hits = tokens
        .iter()
        .filter(|t| suffixes.iter().any(|s| t.ends_with(s) && t.len() > s.len()))
        .count();
    hits as f64 / tokens.len() as f64
}

fn style_fingerprint(profile_key: &str) -> String {
    let mut hasher = DefaultHasher::new();
    profile_key.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Build a style profile for one text segment. Returns `None` when the
/// segment tokenizes to zero words so no rate ever divides by zero.
pub fn analyze_style(text: &str) -> Option<StyleProfile> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return None;
    }
    let total = tokens.len();

    let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
    let lexical_diversity = unique.len() as f64 / total as f64;

    // Sentence boundaries for the words-per-sentence average; unfiltered
    // so short sentences still count here.
    let sentences = segment_sentences(text, 1, 0);
    let sentence_count = sentences.len().max(1);
    let avg_words_per_sentence = total as f64 / sentence_count as f64;

    let char_count = text.chars().count().max(1);
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();
    let punctuation_density = punct_count as f64 / char_count as f64;
    let exclamation_rate = text.chars().filter(|&c| c == '!').count() as f64 / sentence_count as f64;
    let question_rate = text.chars().filter(|&c| c == '?').count() as f64 / sentence_count as f64;

    let adjective_rate = suffix_rate(&tokens, &ADJECTIVE_SUFFIXES);
    let verb_rate = suffix_rate(&tokens, &VERB_SUFFIXES);
    let noun_rate = suffix_rate(&tokens, &NOUN_SUFFIXES);

    let syllables: usize = tokens.iter().map(|t| count_syllables(t)).sum();
    let readability_score = readability(avg_words_per_sentence, syllables, total);

    let key = format!(
        "{:.3}|{:.2}|{:.3}|{:.3}|{:.3}|{:.1}",
        lexical_diversity,
        avg_words_per_sentence,
        punctuation_density,
        adjective_rate,
        noun_rate,
        readability_score
    );

    Some(StyleProfile {
        lexical_diversity,
        avg_words_per_sentence,
        punctuation_density,
        exclamation_rate,
        question_rate,
        adjective_rate,
        verb_rate,
        noun_rate,
        readability_score,
        fingerprint: style_fingerprint(&key),
    })
}

/// Scan consecutive paragraph profiles for style discontinuities.
/// Fewer than 2 qualifying paragraphs cannot assert consistency, so the
/// result is flagged `insufficient_data` while staying `consistent`.
pub fn detect_style_shifts(text: &str, thresholds: &ThresholdConfig) -> StyleAnalysis {
    let paragraphs = segment_paragraphs(text, thresholds.min_paragraph_chars);
    let profiles: Vec<StyleProfile> = paragraphs
        .iter()
        .filter_map(|p| analyze_style(&p.text))
        .collect();

    if profiles.len() < 2 {
        return StyleAnalysis {
            shifts: vec![],
            consistent: true,
            insufficient_data: true,
        };
    }

    let mut shifts = Vec::new();
    for (idx, pair) in profiles.windows(2).enumerate() {
        let lexical_delta = (pair[1].lexical_diversity - pair[0].lexical_diversity).abs();
        let sentence_length_delta =
            (pair[1].avg_words_per_sentence - pair[0].avg_words_per_sentence).abs();
        let readability_delta = (pair[1].readability_score - pair[0].readability_score).abs();

        let shifted = lexical_delta > thresholds.lexical_shift_threshold
            || sentence_length_delta > thresholds.sentence_length_shift_threshold
            || readability_delta > thresholds.readability_shift_threshold;
        if !shifted {
            continue;
        }

        let severity = if lexical_delta > thresholds.severe_lexical_shift
            || sentence_length_delta > thresholds.severe_sentence_length_shift
        {
            ShiftSeverity::High
        } else {
            ShiftSeverity::Medium
        };

        shifts.push(StyleShift {
            paragraph_index: (idx + 1) as i32,
            severity,
            lexical_delta,
            sentence_length_delta,
            readability_delta,
        });
    }

    StyleAnalysis {
        consistent: shifts.is_empty(),
        insufficient_data: false,
        shifts,
    }
}
