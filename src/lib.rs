// veritext
// Academic-submission plagiarism engine: compares a submitted document
// against a resolved corpus of prior submissions through lexical,
// semantic, structural and stylometric channels and produces a graded,
// auditable report instead of a single opaque score.

pub mod models;
pub mod services;

pub use models::{
    CandidateDocument, MethodWeights, Report, SentenceMatch, ThresholdConfig, Verdict,
};
pub use services::detection::{PlagiarismEngine, ReportStamp};
pub use services::oracles::{
    Embedder, HttpEmbedder, HttpSemanticJudge, NullEmbedder, NullSemanticJudge, SemanticJudge,
};

use tracing_subscriber::EnvFilter;

/// Install a console tracing subscriber, `RUST_LOG`-filtered, info by
/// default. The library itself only emits events; installing a
/// subscriber is the host application's call.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
