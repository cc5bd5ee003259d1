// Veritext Data Models
// Value objects shared across the detection pipeline. All entities are
// created and consumed within a single evaluation run; nothing here is
// shared or mutated across concurrent evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Comparison Corpus ============

/// A prior submission (or public reference source) the current document
/// is compared against. Fully resolved before the engine runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDocument {
    pub text: String,
    pub source_id: String,
    #[serde(default)]
    pub submitted_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author_id: Option<String>,
}

// ============ Fingerprints & Segments ============

/// Hash-based signature of normalized text. Pre-filter only — never a
/// standalone plagiarism decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub primary_hash: u32,
    pub secondary_hash: u32,
    pub ngram_hashes: Vec<u32>,
}

/// One comparison unit. Offsets are UTF-8 byte positions (0-based,
/// end-exclusive) into the ORIGINAL text so highlighting stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    pub start: i32,
    pub end: i32,
}

// ============ Stylometry ============

/// Per-paragraph (or whole-document) writing-style fingerprint.
/// `lexical_diversity` is always |unique tokens| / |tokens|, recomputed
/// from raw segment text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub lexical_diversity: f64,
    pub avg_words_per_sentence: f64,
    pub punctuation_density: f64,
    pub exclamation_rate: f64,
    pub question_rate: f64,
    pub adjective_rate: f64,
    pub verb_rate: f64,
    pub noun_rate: f64,
    pub readability_score: f64,
    pub fingerprint: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftSeverity {
    High,
    Medium,
}

/// A style discontinuity between consecutive paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleShift {
    pub paragraph_index: i32,
    pub severity: ShiftSeverity,
    pub lexical_delta: f64,
    pub sentence_length_delta: f64,
    pub readability_delta: f64,
}

/// Outcome of the style-shift scan. `insufficient_data` distinguishes
/// "no shift detected" from "fewer than 2 qualifying paragraphs" —
/// `consistent` stays true in both cases for compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAnalysis {
    pub shifts: Vec<StyleShift>,
    pub consistent: bool,
    pub insufficient_data: bool,
}

impl Default for StyleAnalysis {
    fn default() -> Self {
        Self {
            shifts: vec![],
            consistent: true,
            insufficient_data: true,
        }
    }
}

// ============ Matches ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactCopy,
    Paraphrase,
    NearDuplicate,
    SimilarContent,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    VeryHigh,
    High,
    Medium,
    Low,
}

/// One sentence-level match between the current document and a candidate.
/// `similarity` is a percentage in [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceMatch {
    pub original_segment: Segment,
    pub matched_segment: Segment,
    pub source_id: String,
    pub similarity: f64,
    pub match_type: MatchType,
    pub confidence: MatchConfidence,
    pub is_direct: bool,
    pub is_paraphrase: bool,
}

// ============ Document-level Comparison ============

/// Per-method document scores in [0, 1]. `None` means "could not
/// compute" (oracle failed or gated off) and is excluded from the
/// weighted denominator — distinct from a computed zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodScores {
    pub exact: Option<f64>,
    pub lexical: Option<f64>,
    pub ngram: Option<f64>,
    pub structural: Option<f64>,
    pub semantic: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentComparison {
    pub source_id: String,
    pub scores: MethodScores,
    pub overall_score: f64,
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_concepts: Vec<String>,
}

// ============ Semantic Judge ============

/// Document-level semantic oracle response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticJudgment {
    #[serde(default)]
    pub semantic_similarity: f64,
    #[serde(default)]
    pub is_plagiarism: bool,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub shared_concepts: Vec<String>,
}

// ============ Verdict ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictTier {
    Safe,
    Low,
    Moderate,
    High,
    Critical,
}

/// Graded result. Pure function of the aggregated signals; a new run
/// produces a new Verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub overall_score: f64,
    pub tier: VerdictTier,
    pub verdict: String,
    pub message: String,
}

// ============ Derived Views ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapEntry {
    pub segment: Segment,
    pub similarity: f64,
    pub color: String,
}

/// Attribution entry. `likely_original` is an earliest-submission
/// heuristic, not proof of authorship.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub source_id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub submitted_on: Option<DateTime<Utc>>,
    pub match_count: i32,
    pub max_similarity: f64,
    pub likely_original: bool,
}

// ============ Citations ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationSummary {
    pub quote_count: i32,
    pub citation_count: i32,
    pub properly_cited: bool,
}

// ============ Warnings ============

/// Per-candidate problem surfaced in the report instead of aborting the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateWarning {
    pub source_id: String,
    pub reason: String,
}

// ============ Report ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub match_count: i32,
    pub exact_match_count: i32,
    pub paraphrase_count: i32,
    pub candidates_compared: i32,
    pub candidates_skipped: i32,
}

/// The full evaluation result for one (document, comparison-set) pair.
/// `checked: false` + `error: true` means the engine failed to run —
/// distinct from "ran and found nothing".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
    pub checked: bool,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub no_comparisons: bool,
    pub overall_score: f64,
    pub verdict: Verdict,
    pub matches: Vec<SentenceMatch>,
    pub document_comparisons: Vec<DocumentComparison>,
    pub style_analysis: StyleAnalysis,
    pub citation_summary: CitationSummary,
    pub heatmap: Vec<HeatmapEntry>,
    pub timeline: Vec<TimelineEntry>,
    pub warnings: Vec<CandidateWarning>,
    pub summary: ReportSummary,
}

// ============ Configuration ============

/// Named, overridable detection thresholds. Immutable per invocation —
/// never process-wide mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdConfig {
    /// Edit-distance pre-filter before the semantic channel runs.
    #[serde(default = "default_string_prefilter")]
    pub string_prefilter_threshold: f64,
    /// Effective similarity below this never emits a match.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_exact_match")]
    pub exact_match_threshold: f64,
    #[serde(default = "default_near_duplicate")]
    pub near_duplicate_threshold: f64,
    #[serde(default = "default_semantic_match")]
    pub semantic_match_threshold: f64,
    /// A paraphrase requires lexical ratio strictly below this.
    #[serde(default = "default_paraphrase_ceiling")]
    pub paraphrase_lexical_ceiling: f64,
    #[serde(default = "default_very_high_confidence")]
    pub very_high_confidence: f64,
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: f64,
    /// Document-level semantic oracle runs only when a cheaper signal exceeds this.
    #[serde(default = "default_semantic_gate")]
    pub document_semantic_gate: f64,
    #[serde(default = "default_suspicion")]
    pub document_suspicion_threshold: f64,
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
    #[serde(default = "default_min_sentence_words")]
    pub min_sentence_words: usize,
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,
    #[serde(default = "default_lexical_shift")]
    pub lexical_shift_threshold: f64,
    #[serde(default = "default_sentence_length_shift")]
    pub sentence_length_shift_threshold: f64,
    #[serde(default = "default_readability_shift")]
    pub readability_shift_threshold: f64,
    #[serde(default = "default_severe_lexical_shift")]
    pub severe_lexical_shift: f64,
    #[serde(default = "default_severe_sentence_length_shift")]
    pub severe_sentence_length_shift: f64,
    /// "Properly cited" when citations >= this fraction of quotes.
    #[serde(default = "default_citation_ratio")]
    pub citation_ratio: f64,
    #[serde(default = "default_citation_penalty")]
    pub citation_penalty: f64,
    #[serde(default = "default_style_shift_penalty")]
    pub style_shift_penalty: f64,
    #[serde(default = "default_critical_score")]
    pub critical_score: f64,
    #[serde(default = "default_high_score")]
    pub high_score: f64,
    #[serde(default = "default_moderate_score")]
    pub moderate_score: f64,
    #[serde(default = "default_low_score")]
    pub low_score: f64,
    #[serde(default = "default_critical_exact_matches")]
    pub critical_exact_matches: i32,
    #[serde(default = "default_high_exact_matches")]
    pub high_exact_matches: i32,
    #[serde(default = "default_moderate_paraphrases")]
    pub moderate_paraphrases: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            string_prefilter_threshold: default_string_prefilter(),
            match_threshold: default_match_threshold(),
            exact_match_threshold: default_exact_match(),
            near_duplicate_threshold: default_near_duplicate(),
            semantic_match_threshold: default_semantic_match(),
            paraphrase_lexical_ceiling: default_paraphrase_ceiling(),
            very_high_confidence: default_very_high_confidence(),
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
            document_semantic_gate: default_semantic_gate(),
            document_suspicion_threshold: default_suspicion(),
            min_sentence_chars: default_min_sentence_chars(),
            min_sentence_words: default_min_sentence_words(),
            min_paragraph_chars: default_min_paragraph_chars(),
            lexical_shift_threshold: default_lexical_shift(),
            sentence_length_shift_threshold: default_sentence_length_shift(),
            readability_shift_threshold: default_readability_shift(),
            severe_lexical_shift: default_severe_lexical_shift(),
            severe_sentence_length_shift: default_severe_sentence_length_shift(),
            citation_ratio: default_citation_ratio(),
            citation_penalty: default_citation_penalty(),
            style_shift_penalty: default_style_shift_penalty(),
            critical_score: default_critical_score(),
            high_score: default_high_score(),
            moderate_score: default_moderate_score(),
            low_score: default_low_score(),
            critical_exact_matches: default_critical_exact_matches(),
            high_exact_matches: default_high_exact_matches(),
            moderate_paraphrases: default_moderate_paraphrases(),
        }
    }
}

/// Fixed weights for the document-level weighted sum. Renormalized at
/// scoring time by the weights actually available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodWeights {
    #[serde(default = "default_exact_weight")]
    pub exact: f64,
    #[serde(default = "default_lexical_weight")]
    pub lexical: f64,
    #[serde(default = "default_semantic_weight")]
    pub semantic: f64,
    #[serde(default = "default_structural_weight")]
    pub structural: f64,
    #[serde(default = "default_ngram_weight")]
    pub ngram: f64,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            exact: default_exact_weight(),
            lexical: default_lexical_weight(),
            semantic: default_semantic_weight(),
            structural: default_structural_weight(),
            ngram: default_ngram_weight(),
        }
    }
}

// ============ Default Value Functions ============

fn default_string_prefilter() -> f64 { 0.6 }
fn default_match_threshold() -> f64 { 0.75 }
fn default_exact_match() -> f64 { 0.95 }
fn default_near_duplicate() -> f64 { 0.85 }
fn default_semantic_match() -> f64 { 0.90 }
fn default_paraphrase_ceiling() -> f64 { 0.7 }
fn default_very_high_confidence() -> f64 { 0.95 }
fn default_high_confidence() -> f64 { 0.85 }
fn default_medium_confidence() -> f64 { 0.75 }
fn default_semantic_gate() -> f64 { 0.5 }
fn default_suspicion() -> f64 { 0.4 }
fn default_min_sentence_chars() -> usize { 20 }
fn default_min_sentence_words() -> usize { 3 }
fn default_min_paragraph_chars() -> usize { 100 }
fn default_lexical_shift() -> f64 { 0.15 }
fn default_sentence_length_shift() -> f64 { 5.0 }
fn default_readability_shift() -> f64 { 20.0 }
fn default_severe_lexical_shift() -> f64 { 0.25 }
fn default_severe_sentence_length_shift() -> f64 { 10.0 }
fn default_citation_ratio() -> f64 { 0.5 }
fn default_citation_penalty() -> f64 { 10.0 }
fn default_style_shift_penalty() -> f64 { 5.0 }
fn default_critical_score() -> f64 { 70.0 }
fn default_high_score() -> f64 { 50.0 }
fn default_moderate_score() -> f64 { 30.0 }
fn default_low_score() -> f64 { 15.0 }
fn default_critical_exact_matches() -> i32 { 5 }
fn default_high_exact_matches() -> i32 { 3 }
fn default_moderate_paraphrases() -> i32 { 5 }
fn default_exact_weight() -> f64 { 0.30 }
fn default_lexical_weight() -> f64 { 0.20 }
fn default_semantic_weight() -> f64 { 0.30 }
fn default_structural_weight() -> f64 { 0.10 }
fn default_ngram_weight() -> f64 { 0.10 }
