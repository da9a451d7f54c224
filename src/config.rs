//! Configuration loading
//!
//! `civic-ledger.toml` holds the catalog (councils, years, fields), the
//! per-field plausibility rules and the engine tunables:
//!
//! ```toml
//! years = ["2022-23", "2023-24"]
//! current_year = "2023-24"
//!
//! [engine]
//! max_apply_attempts = 3
//!
//! [[council]]
//! slug = "aberdeen-city"
//! name = "Aberdeen City Council"
//!
//! [[field]]
//! slug = "total-debt"
//! name = "Total debt"
//! sensitivity = "open"
//! required = true
//!
//! [rules.total-debt]
//! min = 0
//! max_year_over_year_delta_pct = 50
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::{Catalog, Council, Field, FieldKind, PlausibilityRule};
use crate::core::services::EngineSettings;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("slug regex is valid"));

/// Starter configuration written by `civic-ledger init`
pub const DEFAULT_CONFIG: &str = r#"# civic-ledger configuration
#
# Financial years, oldest first.
years = ["2021-22", "2022-23", "2023-24"]
current_year = "2023-24"

[engine]
max_apply_attempts = 3

[[council]]
slug = "aberdeen-city"
name = "Aberdeen City Council"
type = "unitary"
nation = "Scotland"

[[council]]
slug = "cardiff"
name = "Cardiff Council"
type = "unitary"
nation = "Wales"

# sensitivity: open (applied directly), moderated (reviewed at tier 3),
# restricted (reviewed at tier 5)
[[field]]
slug = "total-debt"
name = "Total debt"
category = "financial"
kind = "number"
sensitivity = "open"
required = true

[[field]]
slug = "usable-reserves"
name = "Usable reserves"
category = "financial"
kind = "number"
sensitivity = "moderated"
required = true
required_since = "2022-23"

[[field]]
slug = "council-tax-band-d"
name = "Council tax (Band D)"
category = "financial"
kind = "number"
sensitivity = "restricted"

[[field]]
slug = "chief-executive"
name = "Chief executive"
category = "characteristic"
kind = "text"
sensitivity = "moderated"

[rules.total-debt]
min = 0
max_year_over_year_delta_pct = 50

[rules.usable-reserves]
min = 0
"#;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A slug does not match `^[a-z0-9][a-z0-9-]*$`
    #[error("invalid {kind} slug '{slug}': use lowercase letters, digits and dashes")]
    InvalidSlug {
        /// What the slug names
        kind: &'static str,
        /// Offending slug
        slug: String,
    },

    /// The same slug or year appears twice
    #[error("duplicate {kind} '{slug}'")]
    Duplicate {
        /// What the slug names
        kind: &'static str,
        /// Repeated slug
        slug: String,
    },

    /// A year reference that is not in `years`
    #[error("unknown financial year '{0}'")]
    UnknownYear(String),

    /// A rule for a field that is not configured
    #[error("rule refers to unknown field '{0}'")]
    UnknownField(String),

    /// A rule that can never be satisfied or does not apply
    #[error("invalid rule for '{field}': {reason}")]
    InvalidRule {
        /// Field slug
        field: String,
        /// What is wrong
        reason: String,
    },
}

/// Parsed `civic-ledger.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Engine tunables
    #[serde(default)]
    pub engine: EngineSettings,

    /// Default year for CLI commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_year: Option<String>,

    /// Financial years, oldest first
    #[serde(default)]
    pub years: Vec<String>,

    /// Councils
    #[serde(default, rename = "council")]
    pub councils: Vec<Council>,

    /// Fields
    #[serde(default, rename = "field")]
    pub fields: Vec<Field>,

    /// Plausibility rules keyed by field slug
    #[serde(default)]
    pub rules: BTreeMap<String, PlausibilityRule>,
}

impl LedgerConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "loaded {}: {} councils, {} fields, {} years",
            path.display(),
            config.councils.len(),
            config.fields.len(),
            config.years.len()
        );
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check slugs, duplicates, year references and rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut years = HashSet::new();
        for year in &self.years {
            if year.trim().is_empty() {
                return Err(ConfigError::InvalidSlug {
                    kind: "year",
                    slug: year.clone(),
                });
            }
            if !years.insert(year.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "year",
                    slug: year.clone(),
                });
            }
        }
        let known_year = |id: &str| {
            if years.contains(id) {
                Ok(())
            } else {
                Err(ConfigError::UnknownYear(id.to_string()))
            }
        };

        if let Some(current) = &self.current_year {
            known_year(current)?;
        }

        check_slugs("council", self.councils.iter().map(|c| c.slug.as_str()))?;
        check_slugs("field", self.fields.iter().map(|f| f.slug.as_str()))?;

        for field in &self.fields {
            if let Some(since) = &field.required_since {
                known_year(since)?;
            }
        }

        for (slug, rule) in &self.rules {
            let field = self
                .fields
                .iter()
                .find(|f| f.slug == *slug)
                .ok_or_else(|| ConfigError::UnknownField(slug.clone()))?;
            check_rule(field, rule)?;
        }
        Ok(())
    }

    /// Build the immutable catalog the engine reads
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(
            self.councils.clone(),
            self.years.clone(),
            self.fields.clone(),
            self.rules.clone(),
            self.current_year.clone(),
        )
    }
}

fn check_slugs<'a>(
    kind: &'static str,
    slugs: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        if !SLUG_REGEX.is_match(slug) {
            return Err(ConfigError::InvalidSlug {
                kind,
                slug: slug.to_string(),
            });
        }
        if !seen.insert(slug) {
            return Err(ConfigError::Duplicate {
                kind,
                slug: slug.to_string(),
            });
        }
    }
    Ok(())
}

fn check_rule(field: &Field, rule: &PlausibilityRule) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRule {
        field: field.slug.clone(),
        reason: reason.to_string(),
    };

    if field.kind != FieldKind::Number {
        return Err(invalid("rules only apply to number fields"));
    }
    let bounds = [rule.min, rule.max, rule.max_year_over_year_delta_pct];
    if bounds.iter().flatten().any(|v| !v.is_finite()) {
        return Err(invalid("thresholds must be finite"));
    }
    if let (Some(min), Some(max)) = (rule.min, rule.max)
        && min > max
    {
        return Err(invalid("min is greater than max"));
    }
    if rule.max_year_over_year_delta_pct.is_some_and(|pct| pct < 0.0) {
        return Err(invalid("max_year_over_year_delta_pct is negative"));
    }
    Ok(())
}
