// Derived-View Builder
// Presentation-ready projections of the match list: a per-segment
// similarity heatmap and a per-source attribution timeline.

use crate::models::{CandidateDocument, HeatmapEntry, Segment, SentenceMatch, TimelineEntry};
use std::collections::HashMap;

const COLOR_RED: &str = "red";
const COLOR_ORANGE: &str = "orange";
const COLOR_YELLOW: &str = "yellow";
const COLOR_LIGHT_GREEN: &str = "light-green";
const COLOR_GREEN: &str = "green";

fn band_color(similarity: f64) -> &'static str {
    if similarity >= 90.0 {
        COLOR_RED
    } else if similarity >= 75.0 {
        COLOR_ORANGE
    } else if similarity >= 60.0 {
        COLOR_YELLOW
    } else if similarity >= 40.0 {
        COLOR_LIGHT_GREEN
    } else {
        COLOR_GREEN
    }
}

fn ranges_overlap(a: &Segment, b: &Segment) -> bool {
    a.start < b.end && b.start < a.end
}

/// One heatmap entry per current-document segment, carrying the highest
/// similarity of any match whose original segment overlaps it (0 when
/// nothing matched there).
pub fn build_heatmap(segments: &[Segment], matches: &[SentenceMatch]) -> Vec<HeatmapEntry> {
    segments
        .iter()
        .map(|segment| {
            let similarity = matches
                .iter()
                .filter(|m| ranges_overlap(&m.original_segment, segment))
                .map(|m| m.similarity)
                .fold(0.0, f64::max);
            HeatmapEntry {
                segment: segment.clone(),
                similarity,
                color: band_color(similarity).to_string(),
            }
        })
        .collect()
}

/// Group matches by candidate source and flag the earliest-submitted
/// source as the likely original. Earliest submission is a heuristic —
/// it suggests copy direction, it does not prove it.
pub fn build_timeline(
    matches: &[SentenceMatch],
    candidates: &[CandidateDocument],
) -> Vec<TimelineEntry> {
    let by_id: HashMap<&str, &CandidateDocument> = candidates
        .iter()
        .map(|c| (c.source_id.as_str(), c))
        .collect();

    let mut grouped: HashMap<&str, (i32, f64)> = HashMap::new();
    for m in matches {
        let entry = grouped.entry(m.source_id.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 = entry.1.max(m.similarity);
    }

    let mut entries: Vec<TimelineEntry> = grouped
        .into_iter()
        .map(|(source_id, (match_count, max_similarity))| {
            let candidate = by_id.get(source_id);
            TimelineEntry {
                source_id: source_id.to_string(),
                author_id: candidate.and_then(|c| c.author_id.clone()),
                submitted_on: candidate.and_then(|c| c.submitted_on),
                match_count,
                max_similarity,
                likely_original: false,
            }
        })
        .collect();

    // Deterministic order regardless of hash-map iteration.
    entries.sort_by(|a, b| {
        b.max_similarity
            .partial_cmp(&a.max_similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });

    if let Some(earliest) = entries
        .iter()
        .filter_map(|e| e.submitted_on.map(|ts| (ts, e.source_id.clone())))
        .min()
    {
        for entry in &mut entries {
            if entry.source_id == earliest.1 {
                entry.likely_original = true;
            }
        }
    }

    entries
}
