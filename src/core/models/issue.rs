//! Data-quality issues
//!
//! Issues are derived from canonical records by the detector and are never
//! stored authoritatively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Triple;

/// Classification of a data-quality issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// A required value has never been recorded
    Missing,
    /// A recorded value fails a plausibility rule
    Suspicious,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Suspicious => write!(f, "suspicious"),
        }
    }
}

impl std::str::FromStr for IssueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "missing" => Ok(Self::Missing),
            "suspicious" => Ok(Self::Suspicious),
            _ => Err(format!("Invalid issue kind: {s}. Use: missing, suspicious")),
        }
    }
}

/// Which plausibility rule a suspicious value failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SuspicionReason {
    /// Value is below the configured minimum
    BelowMinimum {
        /// Configured minimum
        min: f64,
        /// Offending value
        value: f64,
    },
    /// Value is above the configured maximum
    AboveMaximum {
        /// Configured maximum
        max: f64,
        /// Offending value
        value: f64,
    },
    /// Value is zero but the previous year's was not
    ZeroAfterNonZero {
        /// Previous year's value
        previous: f64,
    },
    /// Change from the previous year exceeds the configured limit
    YearOverYearDelta {
        /// Previous year's value
        previous: f64,
        /// Offending value
        value: f64,
        /// Observed change, in percent of the previous value
        delta_pct: f64,
        /// Configured limit, in percent
        limit_pct: f64,
    },
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BelowMinimum { min, value } => write!(f, "{value} is below minimum {min}"),
            Self::AboveMaximum { max, value } => write!(f, "{value} is above maximum {max}"),
            Self::ZeroAfterNonZero { previous } => {
                write!(f, "zero after {previous} in the previous year")
            },
            Self::YearOverYearDelta {
                previous,
                value,
                delta_pct,
                limit_pct,
            } => write!(
                f,
                "{previous} -> {value} changes by {delta_pct:.1}% (limit {limit_pct}%)"
            ),
        }
    }
}

/// A detected data-quality issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Affected record
    pub triple: Triple,
    /// Missing or suspicious
    pub kind: IssueKind,
    /// Failed rule, for suspicious values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SuspicionReason>,
    /// When the scan that found it started
    pub detected_at: DateTime<Utc>,
}

impl Issue {
    /// Identity of the issue independent of when it was detected
    #[must_use]
    pub const fn key(&self) -> (&Triple, IssueKind) {
        (&self.triple, self.kind)
    }
}
