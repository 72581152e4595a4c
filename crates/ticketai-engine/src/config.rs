//! Configuration
//!
//! One TOML file with a section per concern. Every field has a default, so an
//! empty file (or no file) is a valid configuration apart from the model
//! credentials.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use ticketai_core::errors::{ExError, ExErrorKind, Result};
use ticketai_core::logging_facility::Profile;
use ticketai_core::registry::{DEFAULT_SCHEMA, DEFAULT_TOP};
use ticketai_core::ViewRegistry;
use ticketai_core_types::Sensitive;

pub const DEFAULT_CONFIG_FILE: &str = "ticketai.toml";

/// Overrides `model.api_key`
pub const ENV_MODEL_API_KEY: &str = "TICKETAI_MODEL_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub report: ReportConfig,
    pub advisor: AdvisorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".ticketai/tickets.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Sensitive<String>,
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: Sensitive::default(),
            timeout_seconds: 30,
        }
    }
}

impl ModelConfig {
    /// Base URL, model name and API key are all present
    pub fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty()
            && !self.model.trim().is_empty()
            && !self.api_key.expose().trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub allowed_views: Vec<String>,
    pub default_top: u32,
    pub schema: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            allowed_views: vec![
                "vw_Tickets_AI_Report".to_string(),
                "vw_Users_AI_Safe".to_string(),
                "vw_Products_AI_Safe".to_string(),
            ],
            default_top: DEFAULT_TOP,
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvisorConfig {
    pub candidate_limit: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self { candidate_limit: 8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn profile(&self) -> Profile {
        Profile::parse(&self.profile)
    }
}

impl Config {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on syntax errors, unknown keys or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::InvalidConfig)
                .with_op("config_load")
                .with_message(e.to_string())
        })
    }

    /// Read a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Read `path` if it exists, otherwise start from defaults
    ///
    /// # Errors
    ///
    /// As [`Config::load`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup (tests use a map)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_MODEL_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.model.api_key = Sensitive::new(key);
        }
    }

    /// Build the view registry described by `[report]`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` as described on [`ViewRegistry::new`].
    pub fn view_registry(&self) -> Result<ViewRegistry> {
        ViewRegistry::new(
            self.report.allowed_views.iter().cloned(),
            self.report.default_top,
            self.report.schema.clone(),
        )
    }
}
