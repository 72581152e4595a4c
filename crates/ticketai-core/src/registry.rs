//! View registry
//!
//! The allow-list of views a model-proposed plan may target, plus the row cap
//! and schema every executed statement uses. Built once from configuration
//! and shared behind an `Arc`; there is no way to mutate it afterwards.

use crate::errors::{ExError, ExErrorKind, Result};

pub const DEFAULT_TOP: u32 = 50;
pub const DEFAULT_SCHEMA: &str = "main";

/// Immutable, case-insensitive allow-list of views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRegistry {
    views: Vec<String>,
    default_top: u32,
    schema: String,
}

impl ViewRegistry {
    /// Build a registry, rejecting anything that could not be spliced into
    /// SQL verbatim
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the list is empty, the row cap is zero, a name or
    /// the schema is not a plain identifier, or two names differ only by case.
    pub fn new<I, S>(views: I, default_top: u32, schema: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = schema.into();
        if !is_identifier(&schema) {
            return Err(config_error(format!(
                "schema '{schema}' is not a plain SQL identifier"
            )));
        }
        if default_top == 0 {
            return Err(config_error("default_top must be greater than zero"));
        }

        let mut accepted: Vec<String> = Vec::new();
        for view in views {
            let view = view.into().trim().to_string();
            if !is_identifier(&view) {
                return Err(config_error(format!(
                    "view '{view}' is not a plain SQL identifier"
                )));
            }
            if accepted.iter().any(|v| v.eq_ignore_ascii_case(&view)) {
                return Err(config_error(format!("view '{view}' is listed twice")));
            }
            accepted.push(view);
        }

        if accepted.is_empty() {
            return Err(config_error("at least one allowed view is required"));
        }

        Ok(Self {
            views: accepted,
            default_top,
            schema,
        })
    }

    /// Canonical spelling of `name`, if allow-listed
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.views
            .iter()
            .find(|v| v.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn views(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(String::as_str)
    }

    pub fn default_top(&self) -> u32 {
        self.default_top
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("view_registry")
        .with_message(message)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ViewRegistry {
        ViewRegistry::new(
            ["vw_Tickets_AI_Report", "vw_Users_AI_Safe"],
            DEFAULT_TOP,
            DEFAULT_SCHEMA,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_canonical() {
        let reg = registry();
        assert_eq!(reg.lookup("VW_TICKETS_AI_REPORT"), Some("vw_Tickets_AI_Report"));
        assert_eq!(reg.lookup(" vw_users_ai_safe "), Some("vw_Users_AI_Safe"));
        assert_eq!(reg.lookup("vw_Secret"), None);
        assert!(!reg.contains(""));
    }

    #[test]
    fn test_rejects_empty_list() {
        let err = ViewRegistry::new(Vec::<String>::new(), 10, "main").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_rejects_zero_top() {
        let err = ViewRegistry::new(["vw_A"], 0, "main").unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_CONFIG");
    }

    #[test]
    fn test_rejects_non_identifiers() {
        assert!(ViewRegistry::new(["vw_A; DROP TABLE x"], 10, "main").is_err());
        assert!(ViewRegistry::new(["vw_A"], 10, "main.x").is_err());
        assert!(ViewRegistry::new(["9lives"], 10, "main").is_err());
    }

    #[test]
    fn test_rejects_case_insensitive_duplicates() {
        let err = ViewRegistry::new(["vw_A", "VW_a"], 10, "main").unwrap_err();
        assert!(err.message().contains("listed twice"));
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier("_x1"));
        assert!(is_identifier("vw_Tickets_AI_Report"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("dbo.vw"));
    }
}
