// Plagiarism Engine
// Orchestrates the full evaluation of one document against a resolved
// candidate corpus: segmentation, stylometry, citation scan, pairwise
// matching, document-level comparison, scoring and derived views.
// Every failure path returns a Report value; the engine never panics
// outward and never terminates the host.

use crate::models::{
    CandidateDocument, CandidateWarning, MethodWeights, Report, ReportSummary, Segment,
    ThresholdConfig,
};
use crate::services::citations::citation_summary;
use crate::services::detection::matcher::{
    compare_documents, document_comparison, match_segments, prefilter_scan, sort_and_dedup,
};
use crate::services::detection::scoring::{
    build_verdict, exact_match_count, neutral_verdict, paraphrase_count, sentence_level_score,
    weighted_overall,
};
use crate::services::detection::views::{build_heatmap, build_timeline};
use crate::services::oracles::{Embedder, SemanticJudge};
use crate::services::stylometry::detect_style_shifts;
use crate::services::text_processor::segment_sentences;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};
use uuid::Uuid;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-run embedding cache: each distinct sentence text is sent to the
/// oracle at most once, failures included.
type EmbeddingCache = HashMap<String, Option<Vec<f64>>>;

/// Report envelope identity. Injectable: a caller that replays the same
/// inputs and oracle responses under the same stamp gets a byte-for-byte
/// identical report.
#[derive(Debug, Clone)]
pub struct ReportStamp {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportStamp {
    pub fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
        }
    }
}

pub struct PlagiarismEngine<E, J> {
    embedder: E,
    judge: J,
    thresholds: ThresholdConfig,
    weights: MethodWeights,
}

impl<E: Embedder, J: SemanticJudge> PlagiarismEngine<E, J> {
    pub fn new(embedder: E, judge: J) -> Self {
        Self::with_config(embedder, judge, ThresholdConfig::default(), MethodWeights::default())
    }

    pub fn with_config(
        embedder: E,
        judge: J,
        thresholds: ThresholdConfig,
        weights: MethodWeights,
    ) -> Self {
        Self {
            embedder,
            judge,
            thresholds,
            weights,
        }
    }

    /// Evaluate `text` against the candidate corpus. Always returns a
    /// Report: an internal failure is mapped to `checked: false,
    /// error: true` so callers can tell "found nothing" from "did not run".
    pub async fn analyze(&self, text: &str, candidates: &[CandidateDocument]) -> Report {
        self.analyze_stamped(text, candidates, ReportStamp::generate())
            .await
    }

    /// Same as `analyze` with a caller-supplied envelope stamp.
    pub async fn analyze_stamped(
        &self,
        text: &str,
        candidates: &[CandidateDocument],
        stamp: ReportStamp,
    ) -> Report {
        match self.run(text, candidates, &stamp).await {
            Ok(report) => report,
            Err(e) => {
                error!("[ENGINE] analysis failed: {:#}", e);
                error_report(&stamp, e.to_string())
            }
        }
    }

    async fn run(
        &self,
        text: &str,
        candidates: &[CandidateDocument],
        stamp: &ReportStamp,
    ) -> Result<Report> {
        if text.trim().is_empty() {
            bail!("document text is empty");
        }

        let t = &self.thresholds;
        let segments = segment_sentences(text, t.min_sentence_chars, t.min_sentence_words);
        let style_analysis = detect_style_shifts(text, t);
        let citations = citation_summary(text, t.citation_ratio);

        let mut warnings = Vec::new();
        let mut usable: Vec<&CandidateDocument> = Vec::new();
        for candidate in candidates {
            if candidate.text.trim().is_empty() {
                warn!(source_id = %candidate.source_id, "[ENGINE] skipping empty candidate");
                warnings.push(CandidateWarning {
                    source_id: candidate.source_id.clone(),
                    reason: "candidate text is empty".to_string(),
                });
            } else {
                usable.push(candidate);
            }
        }

        if usable.is_empty() {
            info!("[ENGINE] no usable candidates, returning neutral report");
            let mut report = empty_report(stamp);
            report.no_comparisons = true;
            report.verdict = neutral_verdict();
            report.style_analysis = style_analysis;
            report.citation_summary = citations;
            report.heatmap = build_heatmap(&segments, &[]);
            report.summary.candidates_skipped = warnings.len() as i32;
            report.warnings = warnings;
            return Ok(report);
        }

        info!(
            segments = segments.len(),
            candidates = usable.len(),
            "[ENGINE] starting comparison"
        );

        let mut cache: EmbeddingCache = HashMap::new();
        let mut all_matches = Vec::new();
        let mut comparisons = Vec::new();

        for candidate in &usable {
            let cand_segments =
                segment_sentences(&candidate.text, t.min_sentence_chars, t.min_sentence_words);

            // One ratio matrix per candidate, shared between embedding
            // selection and matching; only sentences in a pair past the
            // lexical pre-filter are worth embedding.
            let scan = prefilter_scan(&segments, &cand_segments, t.string_prefilter_threshold);

            let current_embeddings = self
                .embed_selected(&segments, &scan.needed_current, &mut cache)
                .await;
            let candidate_embeddings = self
                .embed_selected(&cand_segments, &scan.needed_candidate, &mut cache)
                .await;

            let matches = match_segments(
                &segments,
                &current_embeddings,
                &cand_segments,
                &candidate_embeddings,
                &scan.ratios,
                &candidate.source_id,
                t,
            );
            info!(
                source_id = %candidate.source_id,
                matches = matches.len(),
                "[ENGINE] candidate compared"
            );
            all_matches.extend(matches);

            let (scores, rationale, concepts) =
                compare_documents(text, &candidate.text, &candidate.source_id, &self.judge, t)
                    .await;
            let overall = weighted_overall(&scores, &self.weights);
            comparisons.push(document_comparison(
                &candidate.source_id,
                scores,
                overall,
                rationale,
                concepts,
                t,
            ));
        }

        let matches = sort_and_dedup(all_matches);
        let matches_total = matches.len() as i32;
        let exact_matches = exact_match_count(&matches);
        let paraphrases = paraphrase_count(&matches);
        let score = sentence_level_score(&matches, &citations, &style_analysis, t);
        let verdict = build_verdict(score, exact_matches, paraphrases, t);

        let heatmap = build_heatmap(&segments, &matches);
        let candidate_docs: Vec<CandidateDocument> =
            usable.iter().map(|c| (*c).clone()).collect();
        let timeline = build_timeline(&matches, &candidate_docs);

        info!(
            matches = matches.len(),
            exact_matches,
            score = verdict.overall_score,
            tier = ?verdict.tier,
            "[ENGINE] analysis complete"
        );

        Ok(Report {
            request_id: stamp.request_id.clone(),
            generated_at: stamp.generated_at,
            engine_version: ENGINE_VERSION.to_string(),
            checked: true,
            error: false,
            message: None,
            no_comparisons: false,
            overall_score: verdict.overall_score,
            verdict,
            document_comparisons: comparisons,
            style_analysis,
            citation_summary: citations,
            heatmap,
            timeline,
            summary: ReportSummary {
                match_count: matches_total,
                exact_match_count: exact_matches,
                paraphrase_count: paraphrases,
                candidates_compared: usable.len() as i32,
                candidates_skipped: warnings.len() as i32,
            },
            matches,
            warnings,
        })
    }

    async fn embed_selected(
        &self,
        segments: &[Segment],
        needed: &HashSet<usize>,
        cache: &mut EmbeddingCache,
    ) -> Vec<Option<Vec<f64>>> {
        let mut embeddings = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            if !needed.contains(&i) {
                embeddings.push(None);
                continue;
            }
            if let Some(cached) = cache.get(&segment.text) {
                embeddings.push(cached.clone());
                continue;
            }
            let embedding = self.embedder.embed(&segment.text).await;
            cache.insert(segment.text.clone(), embedding.clone());
            embeddings.push(embedding);
        }
        embeddings
    }
}

fn empty_report(stamp: &ReportStamp) -> Report {
    Report {
        request_id: stamp.request_id.clone(),
        generated_at: stamp.generated_at,
        engine_version: ENGINE_VERSION.to_string(),
        checked: true,
        error: false,
        message: None,
        no_comparisons: false,
        overall_score: 0.0,
        verdict: neutral_verdict(),
        matches: vec![],
        document_comparisons: vec![],
        style_analysis: Default::default(),
        citation_summary: Default::default(),
        heatmap: vec![],
        timeline: vec![],
        warnings: vec![],
        summary: ReportSummary::default(),
    }
}

fn error_report(stamp: &ReportStamp, message: String) -> Report {
    let mut report = empty_report(stamp);
    report.checked = false;
    report.error = true;
    report.message = Some(message);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchConfidence, MatchType, VerdictTier};
    use crate::services::oracles::{NullEmbedder, NullSemanticJudge};

    fn engine() -> PlagiarismEngine<NullEmbedder, NullSemanticJudge> {
        PlagiarismEngine::new(NullEmbedder, NullSemanticJudge)
    }

    fn candidate(source_id: &str, text: &str) -> CandidateDocument {
        CandidateDocument {
            text: text.to_string(),
            source_id: source_id.to_string(),
            submitted_on: None,
            author_id: None,
        }
    }

    const SHARED: &str = "The industrial revolution transformed urban labor markets across Europe.";

    #[tokio::test]
    async fn test_identical_sentence_produces_exact_copy_match() {
        let document = format!(
            "{SHARED} Unrelated filler commentary rounds out this paragraph nicely today."
        );
        let cand_text = format!(
            "{SHARED} A different closing remark appears in the candidate document here."
        );
        let report = engine()
            .analyze(&document, &[candidate("cand-1", &cand_text)])
            .await;

        assert!(report.checked);
        assert!(!report.error);
        assert!(!report.no_comparisons);
        assert_eq!(report.summary.candidates_compared, 1);

        let exact: Vec<_> = report
            .matches
            .iter()
            .filter(|m| m.match_type == MatchType::ExactCopy)
            .collect();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].confidence, MatchConfidence::VeryHigh);
        assert!(exact[0].similarity > 99.0);
        assert_eq!(exact[0].source_id, "cand-1");
        assert_eq!(report.summary.exact_match_count, 1);
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_neutral_not_error() {
        let report = engine()
            .analyze("A perfectly ordinary document with several words in it.", &[])
            .await;
        assert!(report.checked);
        assert!(!report.error);
        assert!(report.no_comparisons);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.verdict.verdict, "Cannot Determine");
        assert_eq!(report.verdict.tier, VerdictTier::Safe);
    }

    #[tokio::test]
    async fn test_empty_document_is_error_report() {
        let report = engine().analyze("   \n  ", &[candidate("cand-1", SHARED)]).await;
        assert!(!report.checked);
        assert!(report.error);
        assert!(report.message.is_some());
    }

    #[tokio::test]
    async fn test_malformed_candidate_skipped_with_warning() {
        let report = engine()
            .analyze(SHARED, &[candidate("cand-empty", "   ")])
            .await;
        assert!(report.checked);
        assert!(report.no_comparisons);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].source_id, "cand-empty");
        assert_eq!(report.summary.candidates_skipped, 1);
    }

    #[tokio::test]
    async fn test_malformed_candidate_does_not_abort_batch() {
        let report = engine()
            .analyze(
                SHARED,
                &[candidate("cand-empty", ""), candidate("cand-1", SHARED)],
            )
            .await;
        assert!(!report.no_comparisons);
        assert_eq!(report.summary.candidates_compared, 1);
        assert_eq!(report.summary.candidates_skipped, 1);
        assert!(!report.matches.is_empty());
    }

    #[tokio::test]
    async fn test_null_oracles_still_produce_matches() {
        // Lexical-only mode: both oracles unavailable, matching must
        // still work from the edit-distance channel alone.
        let report = engine().analyze(SHARED, &[candidate("cand-1", SHARED)]).await;
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].match_type, MatchType::ExactCopy);
        // Judge unavailable: semantic channel excluded, not zeroed.
        assert!(report.document_comparisons[0].scores.semantic.is_none());
        assert!(report.document_comparisons[0].suspicious);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_byte_identical() {
        let document = format!("{SHARED} The second sentence also appears in both documents verbatim.");
        let candidates = vec![
            candidate("cand-a", &document),
            candidate("cand-b", SHARED),
        ];
        use chrono::TimeZone;
        let stamp = ReportStamp {
            request_id: "req-0001".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        };
        let eng = engine();
        let first = eng
            .analyze_stamped(&document, &candidates, stamp.clone())
            .await;
        let second = eng.analyze_stamped(&document, &candidates, stamp).await;

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_heatmap_covers_all_segments() {
        let document = format!(
            "{SHARED} This extra sentence exists only in the submitted document itself."
        );
        let report = engine().analyze(&document, &[candidate("cand-1", SHARED)]).await;
        assert_eq!(report.heatmap.len(), 2);
        assert!(report.heatmap[0].similarity > 99.0);
        assert_eq!(report.heatmap[0].color, "red");
        assert_eq!(report.heatmap[1].similarity, 0.0);
        assert_eq!(report.heatmap[1].color, "green");
    }
}
