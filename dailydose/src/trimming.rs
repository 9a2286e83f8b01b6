//! Heuristic article trimming before summarization.
//!
//! Long articles are cut down to their lead and conclusion so the completion
//! request stays small. Sentence detection is a punctuation heuristic, not a
//! tokenizer: a `.` or `?` followed by one whitespace character ends a sentence
//! unless it closes an initialism (`U.S. `, `e.g. `) or a short title (`Mr. `).

use regex::Regex;
use std::sync::LazyLock;

/// Sentences kept from each end of a long article.
pub const KEEP_EACH_END: usize = 3;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?]\s").expect("sentence boundary pattern is valid"));

/// Split `text` into sentences. The whitespace character at each boundary is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in BOUNDARY.find_iter(text) {
        // the punctuation mark is always a single ASCII byte
        let head = &text[..m.start() + 1];
        if is_abbreviation(head) {
            continue;
        }
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }

    sentences.push(&text[start..]);
    sentences
}

/// Keep the first and last [`KEEP_EACH_END`] sentences of long text.
///
/// Text with at most `2 * KEEP_EACH_END` sentences is returned unchanged;
/// otherwise the kept sentences are joined with single spaces.
pub fn trim_article(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= KEEP_EACH_END * 2 {
        return text.to_string();
    }

    let tail = sentences.len() - KEEP_EACH_END;
    sentences[..KEEP_EACH_END]
        .iter()
        .chain(&sentences[tail..])
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_abbreviation(head: &str) -> bool {
    let mut rev = head.chars().rev();
    let last = rev.next();
    let c1 = rev.next();
    let c2 = rev.next();
    let c3 = rev.next();

    // "x.y." style initialisms
    if let (Some(a), Some('.'), Some(b)) = (c3, c2, c1) {
        if is_word(a) && is_word(b) {
            return true;
        }
    }

    // "Mr." style titles
    matches!(
        (c2, c1, last),
        (Some(u), Some(l), Some('.')) if u.is_ascii_uppercase() && l.is_ascii_lowercase()
    )
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
