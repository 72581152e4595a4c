//! Plan validator
//!
//! The trust boundary between model output and SQL text. A [`QueryPlan`]
//! comes in, and either a [`ValidatedPlan`] or the first rule violation comes
//! out. `ValidatedPlan` has no public constructor, so anything that builds SQL
//! from one has provably been through here.
//!
//! Rule order: view rules, the empty-fragment pass, then the deny rules
//! (terminator, comments, table references, keywords, textual status), then
//! the shape and connector rules. Deny rules run before the shape rule so a
//! fragment like `DROP TABLE Users` is reported as what it is. The keyword
//! and schema-qualifier rules skip the contents of quoted literals.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::errors::ValidationError;
use crate::plan::QueryPlan;
use crate::registry::ViewRegistry;

/// Keywords that never belong in a predicate fragment
pub const FORBIDDEN_KEYWORDS: [&str; 15] = [
    "select",
    "from",
    "join",
    "insert",
    "update",
    "delete",
    "drop",
    "alter",
    "create",
    "exec",
    "execute",
    "with",
    "union",
    "intersect",
    "except",
];

/// Substrings that name tables, views or schemas
pub const TABLE_TOKENS: [&str; 3] = ["vw_", "dbo.", "sqlite_"];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b({})\b", FORBIDDEN_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("valid keyword regex")
});

static TEXTUAL_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bstatus\s*(=|<>|!=|<=|>=|<|>|\blike\b|\bin\s*\()\s*['"]"#)
        .expect("valid status regex")
});

// `ident.` qualifiers, compared against the configured schema
static QUALIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\.").expect("valid qualifier regex")
});

/// A plan that passed every rule
///
/// Carries the registry's spelling of the view and the trimmed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPlan {
    view: String,
    fragment: String,
}

impl ValidatedPlan {
    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

/// Stateless rule engine bound to one registry
#[derive(Debug, Clone)]
pub struct PlanValidator {
    registry: Arc<ViewRegistry>,
}

impl PlanValidator {
    pub fn new(registry: Arc<ViewRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    /// Check `plan` against every rule
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] hit, in rule order.
    pub fn validate(&self, plan: &QueryPlan) -> Result<ValidatedPlan, ValidationError> {
        let view = plan.view.trim();
        if view.is_empty() {
            return Err(ValidationError::ViewRequired);
        }
        let canonical = self
            .registry
            .lookup(view)
            .ok_or_else(|| ValidationError::ViewNotAllowed {
                view: view.to_string(),
            })?;

        let fragment = plan.fragment.trim();
        if !fragment.is_empty() {
            self.check_deny_rules(fragment)?;
            check_shape(fragment)?;
        }

        Ok(ValidatedPlan {
            view: canonical.to_string(),
            fragment: fragment.to_string(),
        })
    }

    fn check_deny_rules(&self, fragment: &str) -> Result<(), ValidationError> {
        if fragment.contains(';') {
            return Err(ValidationError::SemicolonNotAllowed);
        }

        if fragment.contains("/*") || fragment.contains("--") {
            return Err(ValidationError::CommentNotAllowed);
        }

        let lower = fragment.to_lowercase();
        if let Some(token) = TABLE_TOKENS.iter().find(|t| lower.contains(*t)) {
            return Err(ValidationError::TableReference {
                token: (*token).to_string(),
            });
        }

        // Quoted literals are data, not SQL
        let code = mask_literals(fragment);

        let schema = self.registry.schema();
        if let Some(qualifier) = QUALIFIER_RE
            .captures_iter(&code)
            .filter_map(|c| c.get(1))
            .find(|m| m.as_str().eq_ignore_ascii_case(schema))
        {
            return Err(ValidationError::TableReference {
                token: format!("{}.", qualifier.as_str()),
            });
        }

        if let Some(m) = KEYWORD_RE.find(&code) {
            return Err(ValidationError::ForbiddenKeyword {
                keyword: m.as_str().to_uppercase(),
            });
        }

        if TEXTUAL_STATUS_RE.is_match(fragment) {
            return Err(ValidationError::TextualStatus);
        }

        Ok(())
    }
}

/// Blank out the contents of quoted literals
///
/// Quote characters stay in place and a doubled quote inside a literal is an
/// escape. An unterminated literal leaves the fragment unmasked so every rule
/// still sees the trailing text.
fn mask_literals(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut quote: Option<char> = None;
    let mut chars = fragment.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
            Some(q) if c == q => {
                if chars.peek() == Some(&q) {
                    chars.next();
                    out.push_str("  ");
                } else {
                    quote = None;
                    out.push(c);
                }
            }
            Some(_) => out.push(' '),
        }
    }

    if quote.is_some() {
        fragment.to_string()
    } else {
        out
    }
}

fn check_shape(fragment: &str) -> Result<(), ValidationError> {
    let lower = fragment.to_lowercase();
    if !(lower.starts_with("where ") || lower.starts_with("order by ")) {
        return Err(ValidationError::InvalidFragmentShape);
    }
    if lower.starts_with("where and ") {
        return Err(ValidationError::DanglingConnector);
    }
    Ok(())
}
