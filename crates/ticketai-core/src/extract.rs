//! Model output extraction
//!
//! Language models wrap their answers in markdown fences and chatter even when
//! told not to. This module peels that off and isolates the JSON payload.
//! Nothing here fails: text with no recognizable payload becomes `"{}"` and
//! the decode step decides what an empty object means.

/// Fence marker used by markdown code blocks
pub const FENCE: &str = "```";

/// Language tags stripped after an opening fence
const LANGUAGE_TAGS: [&str; 2] = ["json", "sql"];

/// Returned when no JSON object or array span is present
pub const EMPTY_OBJECT: &str = "{}";

/// Strip a surrounding markdown fence and its language tag
///
/// Slices between the first and the last fence marker. An unterminated fence
/// only loses its opening marker. Text that does not start with a fence is
/// returned trimmed and otherwise untouched.
pub fn strip_fence(text: &str) -> &str {
    let s = text.trim();
    let Some(after_open) = s.strip_prefix(FENCE) else {
        return s;
    };

    let body = match after_open.rfind(FENCE) {
        Some(end) => &after_open[..end],
        None => after_open,
    };

    strip_language_tag(body).trim()
}

fn strip_language_tag(body: &str) -> &str {
    let trimmed = body.trim_start();
    let tag_len = trimmed
        .find(|c: char| c.is_whitespace())
        .unwrap_or(trimmed.len());
    let tag = &trimmed[..tag_len];

    if LANGUAGE_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
        &trimmed[tag_len..]
    } else {
        body
    }
}

/// Isolate the JSON payload from raw model output
///
/// After fence stripping, the object span (first `{` to last `}`) wins. The
/// array span (first `[` to last `]`) is used only when there is no object
/// span or when it encloses the object span. Returns `"{}"` when neither
/// span exists.
///
/// ```
/// use ticketai_core::extract::extract_json;
///
/// let raw = "Sure! Here you go:\n```json\n{\"view\": \"vw_Users_AI_Safe\"}\n```";
/// assert_eq!(extract_json(raw), "{\"view\": \"vw_Users_AI_Safe\"}");
/// assert_eq!(extract_json("no idea"), "{}");
/// ```
pub fn extract_json(raw: &str) -> String {
    let s = strip_fence(raw);

    let span = match (span_of(s, '{', '}'), span_of(s, '[', ']')) {
        (Some(obj), Some(arr)) if arr.0 < obj.0 && arr.1 > obj.1 => arr,
        (Some(obj), _) => obj,
        (None, Some(arr)) => arr,
        (None, None) => return EMPTY_OBJECT.to_string(),
    };

    s[span.0..=span.1].trim().to_string()
}

// Byte offsets of the first `open` and the last `close` after it
fn span_of(s: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = s.find(open)?;
    let end = s.rfind(close)?;
    (end > start).then_some((start, end))
}
