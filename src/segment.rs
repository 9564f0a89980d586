//! Sentence segmentation.
//!
//! Text is split at whitespace that follows `.`, `!` or `?`, then a correction pass re-attaches
//! numbered-list markers (`"2."`) to the sentence they introduce.

use std::sync::LazyLock;

use regex::Regex;

static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));
static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d\.$").expect("valid regex"));
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\.$").expect("valid regex"));

/// One narrated unit. Never empty after trimming.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct DisplayUnit(String);

impl DisplayUnit {
    /// The unit text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, the measure display durations are derived from.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, immutable list of display units.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct SentenceSequence(Vec<DisplayUnit>);

impl SentenceSequence {
    /// Number of units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unit at `idx`.
    pub fn get(&self, idx: usize) -> Option<&DisplayUnit> {
        self.0.get(idx)
    }

    /// Iterate in narration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DisplayUnit> {
        self.0.iter()
    }

    /// Unit texts in narration order.
    pub fn texts(&self) -> Vec<&str> {
        self.0.iter().map(DisplayUnit::as_str).collect()
    }
}

impl FromIterator<String> for SentenceSequence {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(DisplayUnit)
                .collect(),
        )
    }
}

/// Segment `text` into display units.
#[tracing::instrument(skip(text), fields(text_len = text.len()))]
pub fn segment(text: &str) -> SentenceSequence {
    let raw = split_raw(text);
    let seq: SentenceSequence = correct_markers(&raw).into_iter().collect();
    tracing::debug!(raw = raw.len(), units = seq.len(), "segmented text");
    seq
}

/// Naive split at whitespace runs that follow sentence punctuation.
///
/// A boundary is suppressed after dotted abbreviations (`U.S. `) and capitalised title
/// abbreviations (`Mr. `).
pub(crate) fn split_raw(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for m in BOUNDARY.find_iter(text) {
        // The match is one punctuation byte followed by whitespace.
        let head_end = m.start() + 1;
        if suppresses_boundary(&text[..head_end]) {
            continue;
        }
        let piece = text[start..head_end].trim();
        if !piece.is_empty() {
            out.push(piece);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn suppresses_boundary(head: &str) -> bool {
    let mut rev = head.chars().rev();
    let c3 = rev.next();
    let c2 = rev.next();
    let c1 = rev.next();
    let c0 = rev.next();

    // `\w\.\w.` ending at the punctuation, e.g. "U.S."
    if let (Some(c0), Some('.'), Some(c2), Some(_)) = (c0, c1, c2, c3)
        && is_word(c0)
        && is_word(c2)
    {
        return true;
    }
    // `[A-Z][a-z]\.`, e.g. "Mr."
    matches!(
        (c1, c2, c3),
        (Some(a), Some(b), Some('.')) if a.is_ascii_uppercase() && b.is_ascii_lowercase()
    )
}

/// Re-attach list markers to the sentence they introduce.
///
/// A bare `<digit>.` token is held and prefixed to the next prose token, which then starts a new
/// sentence. A sentence that itself ends in `<digit>.` ("Item 1.") absorbs the next token.
pub(crate) fn correct_markers(raw: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut held: Vec<&str> = Vec::new();

    for &token in raw {
        if MARKER.is_match(token) {
            held.push(token);
            continue;
        }

        if !held.is_empty() {
            flush(&mut out, &mut current);
            current = held.join(" ");
            current.push(' ');
            current.push_str(token);
            held.clear();
        } else if TRAILING_NUMBER.is_match(&current) {
            current.push(' ');
            current.push_str(token);
        } else {
            flush(&mut out, &mut current);
            current.push_str(token);
        }
    }

    // Markers with nothing after them stay with the preceding sentence.
    for marker in held {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(marker);
    }
    flush(&mut out, &mut current);
    out
}

fn flush(out: &mut Vec<String>, current: &mut String) {
    let s = current.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
    current.clear();
}
