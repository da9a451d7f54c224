//! Reference data: councils, financial years and fields
//!
//! These are loaded from configuration and never mutated by the engine.

use serde::{Deserialize, Serialize};

/// A local authority whose figures are tracked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Council {
    /// Stable identifier (e.g. "council-a")
    pub slug: String,

    /// Display name
    pub name: String,

    /// Council type, e.g. "unitary" or "district"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub council_type: Option<String>,

    /// Nation the council belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nation: Option<String>,
}

/// A financial year with its position in the total order of years
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinancialYear {
    /// Identifier, e.g. "2023-24"
    pub id: String,
    /// Zero-based ordering position (earlier years are smaller)
    pub position: usize,
}

/// Whether a field holds financial figures or descriptive characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    /// Monetary figures taken from statements of accounts
    #[default]
    Financial,
    /// Descriptive attributes (population, website, ...)
    Characteristic,
}

/// The type of value a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Numeric values, checked against plausibility rules
    #[default]
    Number,
    /// Free text values
    Text,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Per-field classification controlling how edits are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Edits apply directly
    Open,
    /// Edits wait for a reviewer
    #[default]
    Moderated,
    /// Edits wait for an elevated-tier reviewer
    Restricted,
}

impl Sensitivity {
    /// All sensitivities, in increasing order of protection
    pub const ALL: [Self; 3] = [Self::Open, Self::Moderated, Self::Restricted];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Open => 0,
            Self::Moderated => 1,
            Self::Restricted => 2,
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Moderated => write!(f, "moderated"),
            Self::Restricted => write!(f, "restricted"),
        }
    }
}

impl std::str::FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "moderated" => Ok(Self::Moderated),
            "restricted" => Ok(Self::Restricted),
            _ => Err(format!("Invalid sensitivity: {s}. Use: open, moderated, restricted")),
        }
    }
}

/// A tracked data point, e.g. "total-debt"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Stable identifier
    pub slug: String,

    /// Human-readable name
    pub name: String,

    /// Financial or characteristic
    #[serde(default)]
    pub category: FieldCategory,

    /// Accepted value type
    #[serde(default)]
    pub kind: FieldKind,

    /// How edits to this field are moderated
    #[serde(default)]
    pub sensitivity: Sensitivity,

    /// Whether a missing value counts as a data-quality issue
    #[serde(default)]
    pub required: bool,

    /// First year (inclusive) from which the field is required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_since: Option<String>,
}
