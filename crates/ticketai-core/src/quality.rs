//! Output quality evaluation
//!
//! Flags report answers that are technically valid but probably not what the
//! user asked for: an unfiltered scan that found nothing, or one of the
//! catch-all fragments the model falls back to when it did not understand.

use serde::{Deserialize, Serialize};

/// Fragments the model emits when it could not map the request
pub const DEFAULT_FRAGMENTS: [&str; 4] = [
    "order by createdat desc",
    "where status in (0,1,2) order by createdat desc",
    "where status<>4 order by createdat desc",
    "where status != 4 order by createdat desc",
];

pub const WARNING_NO_RESULTS: &str =
    "No results found. Try again or describe what you need in more detail.";

pub const WARNING_GENERIC_ANSWER: &str = "This is a generic result and may not be related to \
your question. Try again or describe what you need in more detail.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVerdict {
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl QualityVerdict {
    pub fn genuine() -> Self {
        Self::default()
    }

    pub fn fallback(warning: impl Into<String>) -> Self {
        Self {
            is_fallback: true,
            warning: Some(warning.into()),
        }
    }
}

/// Lower-case, trim and collapse runs of whitespace
pub fn canonicalize(fragment: &str) -> String {
    fragment
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct QualityEvaluator {
    defaults: Vec<String>,
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::standard()
    }
}

impl QualityEvaluator {
    /// Evaluator seeded with [`DEFAULT_FRAGMENTS`]
    pub fn standard() -> Self {
        Self::with_defaults(DEFAULT_FRAGMENTS)
    }

    pub fn with_defaults<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            defaults: defaults.into_iter().map(|d| canonicalize(d.as_ref())).collect(),
        }
    }

    pub fn evaluate(&self, fragment: &str, row_count: usize) -> QualityVerdict {
        let canon = canonicalize(fragment);

        if canon.is_empty() {
            return if row_count > 0 {
                QualityVerdict::genuine()
            } else {
                QualityVerdict::fallback(WARNING_NO_RESULTS)
            };
        }

        if self.defaults.iter().any(|d| *d == canon) {
            return QualityVerdict::fallback(WARNING_GENERIC_ANSWER);
        }

        QualityVerdict::genuine()
    }
}
