// Match Aggregator
// Runs the comparators pairwise across current-vs-candidate sentences
// and once per candidate at document level, classifies each match,
// assigns confidence and deduplicates.

use crate::models::{
    DocumentComparison, MatchConfidence, MatchType, MethodScores, Segment, SentenceMatch,
    ThresholdConfig,
};
use crate::services::detection::lexical::{
    document_lexical_score, ngram_similarity, string_similarity, structural_similarity,
};
use crate::services::detection::semantic::semantic_similarity_from;
use crate::services::fingerprint::fingerprint;
use crate::services::oracles::SemanticJudge;
use crate::services::text_processor::normalize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

const DOCUMENT_NGRAM_SIZE: usize = 3;

/// Classification rules, evaluated in order — first match wins. A
/// lexical ratio at or above the exact threshold is an exact copy no
/// matter what the semantic channel says.
fn classify(lexical_ratio: f64, semantic_sim: f64, thresholds: &ThresholdConfig) -> MatchType {
    if lexical_ratio >= thresholds.exact_match_threshold {
        MatchType::ExactCopy
    } else if semantic_sim >= thresholds.semantic_match_threshold
        && lexical_ratio < thresholds.paraphrase_lexical_ceiling
    {
        MatchType::Paraphrase
    } else if lexical_ratio >= thresholds.near_duplicate_threshold {
        MatchType::NearDuplicate
    } else {
        MatchType::SimilarContent
    }
}

fn confidence(effective: f64, thresholds: &ThresholdConfig) -> MatchConfidence {
    if effective >= thresholds.very_high_confidence {
        MatchConfidence::VeryHigh
    } else if effective >= thresholds.high_confidence {
        MatchConfidence::High
    } else if effective >= thresholds.medium_confidence {
        MatchConfidence::Medium
    } else {
        MatchConfidence::Low
    }
}

fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}

/// Lexical pre-scan over every segment pair: the edit-distance ratio
/// matrix plus the segment indexes that appear in at least one pair
/// past the pre-filter. Computed once per candidate and shared between
/// embedding selection and matching so no pair pays the DP twice.
pub struct PrefilterScan {
    pub ratios: Vec<Vec<f64>>,
    pub needed_current: HashSet<usize>,
    pub needed_candidate: HashSet<usize>,
}

pub fn prefilter_scan(
    current: &[Segment],
    candidate: &[Segment],
    threshold: f64,
) -> PrefilterScan {
    let mut ratios = vec![vec![0.0f64; candidate.len()]; current.len()];
    let mut needed_current = HashSet::new();
    let mut needed_candidate = HashSet::new();

    for (i, orig) in current.iter().enumerate() {
        for (j, cand) in candidate.iter().enumerate() {
            let ratio = string_similarity(&orig.text, &cand.text);
            ratios[i][j] = ratio;
            if ratio >= threshold {
                needed_current.insert(i);
                needed_candidate.insert(j);
            }
        }
    }

    PrefilterScan {
        ratios,
        needed_current,
        needed_candidate,
    }
}

/// Compare every current segment against every candidate segment.
/// `lexical_ratios` comes from `prefilter_scan` over the same slices;
/// embedding slices are aligned with their segment slices, and a `None`
/// entry degrades that pair's semantic channel to the lexical ratio.
/// Each comparison is a pure function of its two inputs, so callers may
/// distribute this loop freely and merge the outputs afterwards.
pub fn match_segments(
    current: &[Segment],
    current_embeddings: &[Option<Vec<f64>>],
    candidate: &[Segment],
    candidate_embeddings: &[Option<Vec<f64>>],
    lexical_ratios: &[Vec<f64>],
    source_id: &str,
    thresholds: &ThresholdConfig,
) -> Vec<SentenceMatch> {
    let mut matches = Vec::new();

    for (i, orig) in current.iter().enumerate() {
        for (j, cand) in candidate.iter().enumerate() {
            let lexical_ratio = lexical_ratios[i][j];
            // Pre-filter before the semantic channel runs.
            if lexical_ratio < thresholds.string_prefilter_threshold {
                continue;
            }

            let semantic_sim = semantic_similarity_from(
                current_embeddings.get(i).and_then(|e| e.as_deref()),
                candidate_embeddings.get(j).and_then(|e| e.as_deref()),
                &orig.text,
                &cand.text,
            );

            let effective = lexical_ratio.max(semantic_sim);
            if effective < thresholds.match_threshold {
                continue;
            }

            let match_type = classify(lexical_ratio, semantic_sim, thresholds);
            matches.push(SentenceMatch {
                original_segment: orig.clone(),
                matched_segment: cand.clone(),
                source_id: source_id.to_string(),
                similarity: round4(effective * 100.0),
                match_type,
                confidence: confidence(effective, thresholds),
                is_direct: matches!(match_type, MatchType::ExactCopy | MatchType::NearDuplicate),
                is_paraphrase: match_type == MatchType::Paraphrase,
            });
        }
    }

    matches
}

/// Sort descending by similarity, then deduplicate by the
/// (original text, matched text) pair keeping the first occurrence.
/// The ordering is load-bearing: first occurrence after the descending
/// sort is the highest-similarity instance of that pair.
pub fn sort_and_dedup(mut matches: Vec<SentenceMatch>) -> Vec<SentenceMatch> {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then(a.original_segment.start.cmp(&b.original_segment.start))
            .then(a.matched_segment.start.cmp(&b.matched_segment.start))
    });

    let mut seen: HashSet<(String, String)> = HashSet::new();
    matches.retain(|m| {
        seen.insert((
            m.original_segment.text.clone(),
            m.matched_segment.text.clone(),
        ))
    });

    matches
}

/// Whole-document comparison: the exact, lexical, n-gram and structural
/// channels always run; the semantic judge is only consulted when at
/// least one cheaper signal clears the gate, to avoid paying oracle
/// cost on clearly-unrelated pairs. A failed judge yields `None` for
/// the semantic channel (excluded weight), never an error.
pub async fn compare_documents<J: SemanticJudge>(
    current_text: &str,
    candidate_text: &str,
    source_id: &str,
    judge: &J,
    thresholds: &ThresholdConfig,
) -> (MethodScores, Option<String>, Vec<String>) {
    // Hash equality is a pre-filter only; a 32-bit collision must not
    // flag an unrelated pair, so a hit is confirmed on normalized text.
    let exact: f64 = if fingerprint(current_text).primary_hash
        == fingerprint(candidate_text).primary_hash
        && normalize(current_text) == normalize(candidate_text)
    {
        1.0
    } else {
        0.0
    };
    let lexical = document_lexical_score(current_text, candidate_text);
    let ngram = ngram_similarity(current_text, candidate_text, DOCUMENT_NGRAM_SIZE);
    let structural = structural_similarity(current_text, candidate_text);

    let cheapest_max = exact.max(lexical).max(ngram).max(structural);
    let mut judge_rationale = None;
    let mut shared_concepts = Vec::new();
    let semantic = if cheapest_max > thresholds.document_semantic_gate {
        match judge.judge(current_text, candidate_text).await {
            Ok(judgment) => {
                judge_rationale = Some(judgment.rationale);
                shared_concepts = judgment.shared_concepts;
                Some(judgment.semantic_similarity)
            }
            Err(e) => {
                warn!(source_id, "semantic judge failed, excluding channel: {}", e);
                None
            }
        }
    } else {
        debug!(source_id, cheapest_max, "semantic channel gated off");
        None
    };

    (
        MethodScores {
            exact: Some(exact),
            lexical: Some(lexical),
            ngram: Some(ngram),
            structural: Some(structural),
            semantic,
        },
        judge_rationale,
        shared_concepts,
    )
}

/// Assemble the per-candidate comparison record.
pub fn document_comparison(
    source_id: &str,
    scores: MethodScores,
    overall_score: f64,
    judge_rationale: Option<String>,
    shared_concepts: Vec<String>,
    thresholds: &ThresholdConfig,
) -> DocumentComparison {
    DocumentComparison {
        source_id: source_id.to_string(),
        suspicious: overall_score >= thresholds.document_suspicion_threshold,
        overall_score: round4(overall_score),
        scores,
        judge_rationale,
        shared_concepts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticJudgment;
    use crate::services::oracles::{NullSemanticJudge, OracleError};
    use crate::services::text_processor::segment_sentences;

    fn segs(text: &str) -> Vec<Segment> {
        segment_sentences(text, 20, 3)
    }

    fn no_embeddings(n: usize) -> Vec<Option<Vec<f64>>> {
        vec![None; n]
    }

    fn run_match(
        current: &[Segment],
        current_embeddings: &[Option<Vec<f64>>],
        candidate: &[Segment],
        candidate_embeddings: &[Option<Vec<f64>>],
    ) -> Vec<SentenceMatch> {
        let thresholds = ThresholdConfig::default();
        let scan = prefilter_scan(current, candidate, thresholds.string_prefilter_threshold);
        match_segments(
            current,
            current_embeddings,
            candidate,
            candidate_embeddings,
            &scan.ratios,
            "cand-1",
            &thresholds,
        )
    }

    struct FixedJudge(f64);

    impl SemanticJudge for FixedJudge {
        async fn judge(&self, _a: &str, _b: &str) -> Result<SemanticJudgment, OracleError> {
            Ok(SemanticJudgment {
                semantic_similarity: self.0,
                is_plagiarism: self.0 > 0.8,
                rationale: "fixed".to_string(),
                shared_concepts: vec!["topic".to_string()],
            })
        }
    }

    #[test]
    fn test_identical_sentence_is_exact_copy_very_high() {
        let current = segs("The mitochondria is the powerhouse of the cell.");
        let candidate = segs("The mitochondria is the powerhouse of the cell.");
        let matches = run_match(
            &current,
            &no_embeddings(current.len()),
            &candidate,
            &no_embeddings(candidate.len()),
        );
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.match_type, MatchType::ExactCopy);
        assert_eq!(m.confidence, MatchConfidence::VeryHigh);
        assert!(m.similarity > 99.0);
        assert!(m.is_direct);
        assert!(!m.is_paraphrase);
    }

    #[test]
    fn test_high_lexical_ratio_is_exact_copy_regardless_of_semantic() {
        // Semantic channel saturated at 1.0 via identical embeddings;
        // classification must still pick exact_copy from the lexical rule.
        let current = segs("Coral bleaching accelerated sharply across the reef system in 2019.");
        let candidate = segs("Coral bleaching accelerated sharply across the reef systems in 2019.");
        let embedding = vec![Some(vec![0.4, 0.2, 0.8])];
        let matches = run_match(&current, &embedding, &candidate, &embedding.clone());
        assert_eq!(matches.len(), 1);
        assert!(string_similarity(&current[0].text, &candidate[0].text) >= 0.95);
        assert_eq!(matches[0].match_type, MatchType::ExactCopy);
    }

    #[test]
    fn test_paraphrase_requires_high_semantic_low_lexical() {
        // Edit ratio is exactly 1 - 8/24 = 0.667: past the 0.6 pre-filter
        // but under the 0.7 paraphrase ceiling. Near-identical embeddings
        // push the semantic channel past 0.9.
        let seg = |text: &str| {
            vec![Segment {
                text: text.to_string(),
                start: 0,
                end: text.len() as i32,
            }]
        };
        let current = seg("aaaa bbbb cccc dddd eeee");
        let candidate = seg("aaaa bbbb cccc zzzz yyyy");
        let emb_a = vec![Some(vec![0.5, 0.5, 0.1])];
        let emb_b = vec![Some(vec![0.5, 0.5, 0.11])];
        let matches = run_match(&current, &emb_a, &candidate, &emb_b);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Paraphrase);
        assert!(matches[0].is_paraphrase);
        assert!(!matches[0].is_direct);
    }

    #[test]
    fn test_below_match_threshold_emits_nothing() {
        let current = segs("A completely distinct topic about alpine geology and rockfall.");
        let candidate = segs("An unrelated discussion of baroque harpsichord performance practice.");
        let matches = run_match(
            &current,
            &no_embeddings(current.len()),
            &candidate,
            &no_embeddings(candidate.len()),
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_prefilter_scan_ratios_and_needed_sets() {
        let current = segs("The mitochondria is the powerhouse of the cell. Alpine rockfall hazards intensified after the spring thaw this season.");
        let candidate = segs("The mitochondria is the powerhouse of the cell.");
        let scan = prefilter_scan(&current, &candidate, 0.6);

        assert_eq!(scan.ratios.len(), 2);
        assert_eq!(scan.ratios[0].len(), 1);
        for (i, orig) in current.iter().enumerate() {
            for (j, cand) in candidate.iter().enumerate() {
                assert!(
                    (scan.ratios[i][j] - string_similarity(&orig.text, &cand.text)).abs() < 1e-12
                );
            }
        }
        // Only the identical pair clears the pre-filter.
        assert!(scan.needed_current.contains(&0));
        assert!(!scan.needed_current.contains(&1));
        assert!(scan.needed_candidate.contains(&0));
    }

    #[test]
    fn test_dedup_keeps_highest_similarity_instance() {
        let seg = |text: &str, start: i32| Segment {
            text: text.to_string(),
            start,
            end: start + text.len() as i32,
        };
        let mk = |sim: f64, start: i32| SentenceMatch {
            original_segment: seg("same original sentence", start),
            matched_segment: seg("same matched sentence", 0),
            source_id: "cand-1".to_string(),
            similarity: sim,
            match_type: MatchType::SimilarContent,
            confidence: MatchConfidence::Medium,
            is_direct: false,
            is_paraphrase: false,
        };
        let deduped = sort_and_dedup(vec![mk(78.0, 0), mk(91.5, 10), mk(85.0, 20)]);
        assert_eq!(deduped.len(), 1);
        assert!((deduped[0].similarity - 91.5).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_descending() {
        let seg = |text: &str| Segment {
            text: text.to_string(),
            start: 0,
            end: text.len() as i32,
        };
        let mk = |orig: &str, sim: f64| SentenceMatch {
            original_segment: seg(orig),
            matched_segment: seg("matched"),
            source_id: "cand-1".to_string(),
            similarity: sim,
            match_type: MatchType::SimilarContent,
            confidence: MatchConfidence::Medium,
            is_direct: false,
            is_paraphrase: false,
        };
        let sorted = sort_and_dedup(vec![mk("a", 80.0), mk("b", 95.0), mk("c", 88.0)]);
        let sims: Vec<f64> = sorted.iter().map(|m| m.similarity).collect();
        assert_eq!(sims, vec![95.0, 88.0, 80.0]);
    }

    #[tokio::test]
    async fn test_document_semantic_gated_off_for_unrelated_pair() {
        let a = "Quantum error correction requires redundant encoding of logical qubits.";
        let b = "The recipe calls for slow-roasted tomatoes and fresh basil leaves.";
        let (scores, rationale, _) =
            compare_documents(a, b, "cand-1", &FixedJudge(0.9), &ThresholdConfig::default()).await;
        assert!(scores.semantic.is_none());
        assert!(rationale.is_none());
    }

    #[tokio::test]
    async fn test_document_semantic_runs_when_gate_cleared() {
        let a = "The glacier retreated thirty meters during the observation period last year.";
        let (scores, rationale, concepts) =
            compare_documents(a, a, "cand-1", &FixedJudge(0.9), &ThresholdConfig::default()).await;
        assert_eq!(scores.semantic, Some(0.9));
        assert_eq!(rationale.as_deref(), Some("fixed"));
        assert_eq!(concepts, vec!["topic".to_string()]);
        assert_eq!(scores.exact, Some(1.0));
    }

    #[tokio::test]
    async fn test_colliding_hashes_do_not_flag_unrelated_documents() {
        use crate::services::detection::scoring::weighted_overall;
        use crate::models::MethodWeights;

        // "costarring" and "liquid" are a known 32-bit FNV-1a collision
        // and share no text at all.
        let a = "costarring";
        let b = "liquid";
        assert_eq!(
            fingerprint(a).primary_hash,
            fingerprint(b).primary_hash
        );

        let thresholds = ThresholdConfig::default();
        let (scores, _, _) =
            compare_documents(a, b, "cand-1", &NullSemanticJudge, &thresholds).await;
        assert_eq!(scores.exact, Some(0.0));

        let overall = weighted_overall(&scores, &MethodWeights::default());
        let comparison =
            document_comparison("cand-1", scores, overall, None, vec![], &thresholds);
        assert!(!comparison.suspicious);
    }

    #[tokio::test]
    async fn test_failed_judge_excludes_semantic_channel() {
        let a = "The glacier retreated thirty meters during the observation period last year.";
        let (scores, _, _) =
            compare_documents(a, a, "cand-1", &NullSemanticJudge, &ThresholdConfig::default())
                .await;
        assert!(scores.semantic.is_none());
        assert_eq!(scores.exact, Some(1.0));
    }
}
