//! Fragment normalizer
//!
//! Best-effort cleanup of the predicate fragment a model proposes. The output
//! is not trusted: the validator still runs on whatever comes out of here.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::extract::strip_fence;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(where|order\s+by)\s+").expect("valid anchor regex"));

static LEADING_AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^and\s+").expect("valid leading-and regex"));

static WHERE_AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^WHERE\s+and\s+").expect("valid where-and regex"));

// Alternation instead of a backreference: the regex crate has none.
static TEXTUAL_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bstatus\s*=\s*(?:'(open|closed|resolved)'|"(open|closed|resolved)")"#)
        .expect("valid status regex")
});

/// Canonicalize a model-proposed fragment
///
/// Steps, in order: trim, strip a markdown fence, anchor a bare leading
/// `AND`, cut everything before the first `WHERE`/`ORDER BY` (no anchor means
/// the whole fragment is discarded), repair `WHERE AND`, then rewrite textual
/// status literals to their numeric codes. Idempotent.
///
/// ```
/// use ticketai_core::normalize::normalize_fragment;
///
/// let raw = "```sql\nWHERE Status = 'Closed' ORDER BY CreatedAt DESC\n```";
/// assert_eq!(normalize_fragment(raw), "WHERE Status = 4 ORDER BY CreatedAt DESC");
/// ```
pub fn normalize_fragment(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let unfenced = strip_fence(trimmed);

    let anchored = if LEADING_AND_RE.is_match(unfenced) {
        format!("WHERE 1=1 {unfenced}")
    } else {
        unfenced.to_string()
    };

    let Some(anchor) = ANCHOR_RE.captures(&anchored) else {
        return String::new();
    };
    let (Some(whole), Some(keyword)) = (anchor.get(0), anchor.get(1)) else {
        return String::new();
    };

    let canonical = if keyword.as_str().to_ascii_lowercase().starts_with("where") {
        "WHERE "
    } else {
        "ORDER BY "
    };
    let cut = format!("{canonical}{}", &anchored[whole.end()..]);

    let repaired = WHERE_AND_RE.replace(&cut, "WHERE 1=1 AND ");

    let rewritten = TEXTUAL_STATUS_RE.replace_all(&repaired, |caps: &Captures<'_>| {
        let literal = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        match literal.as_str() {
            "open" => "Status IN (0,1,2)",
            "closed" => "Status = 4",
            _ => "Status = 3",
        }
    });

    rewritten.trim().to_string()
}
