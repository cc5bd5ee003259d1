// Scorer / Verdict Engine
// Two scoring paths: the document-level weighted blend of comparison
// channels, and the sentence-level composition of match statistics that
// drives the user-facing verdict. Count-based override rules escalate
// the tier when many small matches would otherwise dilute the average.

use crate::models::{
    CitationSummary, MatchType, MethodScores, MethodWeights, SentenceMatch, ShiftSeverity,
    StyleAnalysis, ThresholdConfig, Verdict, VerdictTier,
};
use tracing::debug;

const SIMILARITY_WEIGHT: f64 = 0.6;
const MATCH_COUNT_WEIGHT: f64 = 0.3;
const MATCH_COUNT_SCALE: f64 = 5.0;
const EXACT_MATCH_BONUS: f64 = 2.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted blend of the document-level channels, renormalized over the
/// weights actually available. A channel whose oracle failed is `None`
/// and drops out of the denominator rather than contributing a zero.
pub fn weighted_overall(scores: &MethodScores, weights: &MethodWeights) -> f64 {
    let channels = [
        (scores.exact, weights.exact),
        (scores.lexical, weights.lexical),
        (scores.semantic, weights.semantic),
        (scores.structural, weights.structural),
        (scores.ngram, weights.ngram),
    ];

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (score, weight) in channels {
        if let Some(s) = score {
            weighted_sum += s * weight;
            weight_total += weight;
        }
    }

    if weight_total == 0.0 {
        return 0.0;
    }
    weighted_sum / weight_total
}

pub fn exact_match_count(matches: &[SentenceMatch]) -> i32 {
    matches
        .iter()
        .filter(|m| m.match_type == MatchType::ExactCopy)
        .count() as i32
}

pub fn paraphrase_count(matches: &[SentenceMatch]) -> i32 {
    matches
        .iter()
        .filter(|m| m.match_type == MatchType::Paraphrase)
        .count() as i32
}

/// Sentence-level overall score in [0, 100]: a blend of average match
/// similarity and match volume, with a flat bonus per exact copy, plus
/// the citation and style-shift penalties.
pub fn sentence_level_score(
    matches: &[SentenceMatch],
    citations: &CitationSummary,
    style: &StyleAnalysis,
    thresholds: &ThresholdConfig,
) -> f64 {
    if matches.is_empty() && citations.properly_cited && style.shifts.is_empty() {
        return 0.0;
    }

    let avg_similarity = if matches.is_empty() {
        0.0
    } else {
        matches.iter().map(|m| m.similarity).sum::<f64>() / matches.len() as f64
    };
    let volume = (matches.len() as f64 * MATCH_COUNT_SCALE).min(100.0);
    let exact_bonus = exact_match_count(matches) as f64 * EXACT_MATCH_BONUS;

    let mut score =
        avg_similarity * SIMILARITY_WEIGHT + volume * MATCH_COUNT_WEIGHT + exact_bonus;

    if !citations.properly_cited {
        score += thresholds.citation_penalty;
    }
    let severe_shifts = style
        .shifts
        .iter()
        .filter(|s| s.severity == ShiftSeverity::High)
        .count();
    score += severe_shifts as f64 * thresholds.style_shift_penalty;

    debug!(
        avg_similarity,
        match_count = matches.len(),
        severe_shifts,
        "sentence-level score composed"
    );

    score.clamp(0.0, 100.0)
}

/// Map score and match counts to a tier, strictest first. The count
/// rules escalate independently of the blended score.
fn tier_for(
    score: f64,
    exact_matches: i32,
    paraphrases: i32,
    thresholds: &ThresholdConfig,
) -> VerdictTier {
    if score >= thresholds.critical_score || exact_matches >= thresholds.critical_exact_matches {
        VerdictTier::Critical
    } else if score >= thresholds.high_score || exact_matches >= thresholds.high_exact_matches {
        VerdictTier::High
    } else if score >= thresholds.moderate_score || paraphrases >= thresholds.moderate_paraphrases {
        VerdictTier::Moderate
    } else if score >= thresholds.low_score {
        VerdictTier::Low
    } else {
        VerdictTier::Safe
    }
}

pub fn build_verdict(
    score: f64,
    exact_matches: i32,
    paraphrases: i32,
    thresholds: &ThresholdConfig,
) -> Verdict {
    let tier = tier_for(score, exact_matches, paraphrases, thresholds);
    let (verdict, message) = match tier {
        VerdictTier::Critical => (
            "Critical Plagiarism Risk",
            "Extensive copied or near-copied material detected.",
        ),
        VerdictTier::High => (
            "High Plagiarism Risk",
            "Substantial overlapping material detected across sources.",
        ),
        VerdictTier::Moderate => (
            "Moderate Similarity",
            "Notable overlap detected; manual review recommended.",
        ),
        VerdictTier::Low => (
            "Low Similarity",
            "Minor overlap detected, likely common phrasing.",
        ),
        VerdictTier::Safe => (
            "Likely Original",
            "No significant overlap with the comparison corpus.",
        ),
    };

    Verdict {
        overall_score: round2(score),
        tier,
        verdict: verdict.to_string(),
        message: message.to_string(),
    }
}

/// Neutral verdict for runs with nothing to compare against.
pub fn neutral_verdict() -> Verdict {
    Verdict {
        overall_score: 0.0,
        tier: VerdictTier::Safe,
        verdict: "Cannot Determine".to_string(),
        message: "No comparison candidates were provided.".to_string(),
    }
}
