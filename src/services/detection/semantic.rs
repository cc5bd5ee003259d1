// Semantic Comparator
// Wraps the embedding oracle behind a plain similarity function with
// graceful degradation: semantic detection is a confidence booster, not
// a hard dependency, so an unavailable oracle falls back to the lexical
// ratio instead of failing the pipeline.

use crate::services::detection::lexical::string_similarity;
use crate::services::oracles::Embedder;

const NORM_EPSILON: f64 = 1e-10;

/// Cosine similarity in a single pass (dot product and both norms
/// accumulated together). Returns 0.0 — never NaN — for zero-norm or
/// dimension-mismatched vectors. Clamped to [0, 1] for scoring use.
pub fn cosine_similarity(u: &[f64], v: &[f64]) -> f64 {
    if u.len() != v.len() || u.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_u = 0.0;
    let mut norm_v = 0.0;
    for (a, b) in u.iter().zip(v.iter()) {
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    if norm_u < NORM_EPSILON || norm_v < NORM_EPSILON {
        return 0.0;
    }

    (dot / (norm_u.sqrt() * norm_v.sqrt())).clamp(0.0, 1.0)
}

/// Embedding-based similarity for a sentence pair, from pre-fetched
/// embeddings. `None` for either embedding degrades to the lexical ratio.
pub fn semantic_similarity_from(
    embedding_a: Option<&[f64]>,
    embedding_b: Option<&[f64]>,
    a: &str,
    b: &str,
) -> f64 {
    match (embedding_a, embedding_b) {
        (Some(u), Some(v)) => cosine_similarity(u, v),
        _ => string_similarity(a, b),
    }
}

/// Convenience path that consults the oracle directly.
pub async fn semantic_similarity<E: Embedder>(embedder: &E, a: &str, b: &str) -> f64 {
    let ea = embedder.embed(a).await;
    let eb = embedder.embed(b).await;
    semantic_similarity_from(ea.as_deref(), eb.as_deref(), a, b)
}
