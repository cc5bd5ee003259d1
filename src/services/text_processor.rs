// Text Processing Service
// Canonicalization, tokenization and segmentation. Everything here is a
// pure function of the input text: both segmentations are restartable
// and produce segments in document order.

use crate::models::Segment;
use regex::Regex;
use std::sync::OnceLock;

fn punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("punct regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn para_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph regex"))
}

/// Canonicalize text for hashing and lexical comparison: lower-case,
/// punctuation to spaces, whitespace collapsed, trimmed. Idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = punct_re().replace_all(&lowered, " ");
    let collapsed = ws_re().replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Word tokens of the normalized form.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split into sentence segments with byte offsets into the ORIGINAL
/// text. Fragments shorter than `min_chars` or with `min_words` words
/// or fewer are discarded as noise.
pub fn segment_sentences(text: &str, min_chars: usize, min_words: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    if text.is_empty() {
        return segments;
    }

    let mut seg_start: Option<usize> = None;
    let mut prev_end = 0usize;

    for (idx, ch) in text.char_indices() {
        let ch_end = idx + ch.len_utf8();
        if !ch.is_whitespace() && seg_start.is_none() {
            seg_start = Some(idx);
        }

        let is_terminator = matches!(ch, '.' | '!' | '?' | '。' | '！' | '？');
        // Decimal points are not sentence boundaries.
        let splits = if ch == '.' {
            let prev_digit = text[..idx].chars().next_back().is_some_and(|c| c.is_ascii_digit());
            let next_digit = text[ch_end..].chars().next().is_some_and(|c| c.is_ascii_digit());
            !(prev_digit && next_digit)
        } else {
            is_terminator
        };

        if is_terminator && splits {
            if let Some(start) = seg_start.take() {
                push_sentence(&mut segments, text, start, ch_end, min_chars, min_words);
            }
        }
        prev_end = ch_end;
    }

    if let Some(start) = seg_start {
        push_sentence(&mut segments, text, start, prev_end, min_chars, min_words);
    }

    segments
}

fn push_sentence(
    segments: &mut Vec<Segment>,
    text: &str,
    start: usize,
    end: usize,
    min_chars: usize,
    min_words: usize,
) {
    let raw = &text[start..end];
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        return;
    }
    let end = start + trimmed.len();
    if trimmed.chars().count() < min_chars || word_count(trimmed) <= min_words {
        return;
    }
    segments.push(Segment {
        text: trimmed.to_string(),
        start: start as i32,
        end: end as i32,
    });
}

/// Split into blank-line-delimited paragraph segments, discarding
/// paragraphs shorter than `min_chars`. Offsets index the original text.
pub fn segment_paragraphs(text: &str, min_chars: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    if text.is_empty() {
        return segments;
    }

    let mut cursor = 0usize;
    for para in para_re().split(text) {
        let trimmed = para.trim();
        let para_pos = cursor;
        cursor += para.len();
        // Account for the consumed separator when scanning forward.
        if !trimmed.is_empty() {
            let start = text[para_pos..]
                .find(trimmed)
                .map(|i| para_pos + i)
                .unwrap_or(para_pos);
            let end = start + trimmed.len();
            if trimmed.chars().count() >= min_chars {
                segments.push(Segment {
                    text: trimmed.to_string(),
                    start: start as i32,
                    end: end as i32,
                });
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("Hello, World!  Twice."), "hello world twice");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("  The QUICK brown-fox;  jumps.  ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("A dog's day!"), vec!["a", "dog", "s", "day"]);
    }

    #[test]
    fn test_segment_sentences_offsets_index_original_text() {
        let text = "This is the first full sentence here. And this is the second full sentence.";
        let segs = segment_sentences(text, 20, 3);
        assert_eq!(segs.len(), 2);
        for seg in &segs {
            assert_eq!(&text[seg.start as usize..seg.end as usize], seg.text);
        }
    }

    #[test]
    fn test_segment_sentences_filters_noise() {
        let text = "Short. This sentence is comfortably long enough to keep around.";
        let segs = segment_sentences(text, 20, 3);
        assert_eq!(segs.len(), 1);
        assert!(segs[0].text.starts_with("This sentence"));
    }

    #[test]
    fn test_segment_sentences_keeps_decimal_numbers_together() {
        let text = "The measured value was 3.14 which matched every expectation we had going in.";
        let segs = segment_sentences(text, 20, 3);
        assert_eq!(segs.len(), 1);
        assert!(segs[0].text.contains("3.14"));
    }

    #[test]
    fn test_segment_sentences_total_order() {
        let text = "First complete sentence for ordering checks. Second complete sentence for ordering checks. Third complete sentence for ordering checks.";
        let segs = segment_sentences(text, 20, 3);
        assert_eq!(segs.len(), 3);
        assert!(segs.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_segment_paragraphs_filters_short() {
        let long_para = "word ".repeat(30);
        let text = format!("Tiny title\n\n{}", long_para.trim());
        let paras = segment_paragraphs(&text, 100);
        assert_eq!(paras.len(), 1);
        assert!(paras[0].text.starts_with("word"));
    }

    #[test]
    fn test_segment_paragraphs_empty() {
        assert!(segment_paragraphs("", 100).is_empty());
    }
}
