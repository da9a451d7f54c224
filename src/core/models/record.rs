//! Canonical records and the triple that keys them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FieldKind;

/// The (council, field, year) key identifying one canonical value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// Council slug
    pub council: String,
    /// Field slug
    pub field: String,
    /// Financial year id
    pub year: String,
}

impl Triple {
    /// Build a triple from its parts
    pub fn new(council: impl Into<String>, field: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            council: council.into(),
            field: field.into(),
            year: year.into(),
        }
    }

    /// The same council and field in another year
    #[must_use]
    pub fn with_year(&self, year: &str) -> Self {
        Self {
            council: self.council.clone(),
            field: self.field.clone(),
            year: year.to_string(),
        }
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.council, self.field, self.year)
    }
}

/// A value held by a canonical record or proposed by a contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric figure
    Number(f64),
    /// Free text
    Text(String),
}

impl FieldValue {
    /// The kind of field this value fits
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Number(_) => FieldKind::Number,
            Self::Text(_) => FieldKind::Text,
        }
    }

    /// Numeric view of the value, if it is a number
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Parse user input according to the field's kind
    ///
    /// Thousands separators are accepted in numbers ("42,000").
    pub fn parse_as(input: &str, kind: FieldKind) -> Result<Self, String> {
        match kind {
            FieldKind::Text => Ok(Self::Text(input.to_string())),
            FieldKind::Number => input
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .map(Self::Number)
                .map_err(|_| format!("Not a number: {input}")),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The current value for a triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Key of this record
    pub triple: Triple,
    /// Current value
    pub value: FieldValue,
    /// Starts at 1 on first write, +1 per successful apply
    pub version: u64,
    /// Time of the last successful apply
    pub last_modified: DateTime<Utc>,
}
