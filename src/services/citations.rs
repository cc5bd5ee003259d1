// Citation Detection
// Regex extraction of citation markers and quoted passages, used for
// the citation penalty in the verdict. A document is "properly cited"
// when at least half of its quotes are accompanied by a citation marker
// (ratio configurable).

use crate::models::CitationSummary;
use regex::Regex;
use std::sync::OnceLock;

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // (Author, 2023) / (Author et al., 2023a)
    RE.get_or_init(|| {
        Regex::new(r"\([A-Z][A-Za-z\s\.&-]+,\s*\d{4}[a-z]?\)").expect("parenthetical regex")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // [1], [23]
    RE.get_or_init(|| Regex::new(r"\[[0-9]{1,3}\]").expect("numeric citation regex"))
}

fn footnote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ^1 style footnote markers
    RE.get_or_init(|| Regex::new(r"\^\d{1,3}").expect("footnote regex"))
}

fn narrative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // APA narrative form: Smith (2023), Smith and Jones (2023)
    RE.get_or_init(|| {
        Regex::new(r"[A-Z][a-z]+(?:\s+(?:and|&)\s+[A-Z][a-z]+)?\s+\(\d{4}[a-z]?\)")
            .expect("narrative regex")
    })
}

fn quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Straight or curly double-quoted runs of at least a few characters.
    RE.get_or_init(|| Regex::new(r#""[^"]{4,}"|\u{201c}[^\u{201d}]{4,}\u{201d}"#).expect("quote regex"))
}

/// Count citation markers across all supported formats.
pub fn count_citations(text: &str) -> usize {
    parenthetical_re().find_iter(text).count()
        + numeric_re().find_iter(text).count()
        + footnote_re().find_iter(text).count()
        + narrative_re().find_iter(text).count()
}

/// Count quoted passages.
pub fn count_quotes(text: &str) -> usize {
    quote_re().find_iter(text).count()
}

/// Summarize quoting vs. citing. With no quotes there is nothing left
/// uncited, so the document counts as properly cited.
pub fn citation_summary(text: &str, citation_ratio: f64) -> CitationSummary {
    let quote_count = count_quotes(text);
    let citation_count = count_citations(text);
    let properly_cited =
        quote_count == 0 || (citation_count as f64) >= citation_ratio * quote_count as f64;

    CitationSummary {
        quote_count: quote_count as i32,
        citation_count: citation_count as i32,
        properly_cited,
    }
}
