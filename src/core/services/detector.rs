//! Issue detector
//!
//! Walks councils × fields × years and classifies each triple as missing,
//! suspicious or fine. Scans are lazy: nothing is read until the iterator
//! is advanced, and dropping it stops the scan. The detector only ever
//! calls `RecordStore::get`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::StoreError;
use crate::core::models::{
    Catalog, Council, Field, FieldKind, FinancialYear, Issue, IssueKind, PlausibilityRule,
    SuspicionReason, Triple,
};
use crate::core::ports::RecordStore;

/// Restricts a scan to some councils, fields or years
///
/// An empty list means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanScope {
    /// Council slugs
    #[serde(default)]
    pub councils: Vec<String>,
    /// Field slugs
    #[serde(default)]
    pub fields: Vec<String>,
    /// Year ids
    #[serde(default)]
    pub years: Vec<String>,
}

impl ScanScope {
    /// Scan everything in the catalog
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a council to the scope
    #[must_use]
    pub fn council(mut self, slug: impl Into<String>) -> Self {
        self.councils.push(slug.into());
        self
    }

    /// Add a field to the scope
    #[must_use]
    pub fn field(mut self, slug: impl Into<String>) -> Self {
        self.fields.push(slug.into());
        self
    }

    /// Add a year to the scope
    #[must_use]
    pub fn year(mut self, id: impl Into<String>) -> Self {
        self.years.push(id.into());
        self
    }
}

fn select<T>(items: &[T], wanted: &[String], key: impl Fn(&T) -> &str) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| wanted.is_empty() || wanted.iter().any(|w| w == key(*item)))
        .map(|(i, _)| i)
        .collect()
}

/// Detects missing and suspicious values
#[derive(Clone)]
pub struct IssueDetector {
    store: Arc<dyn RecordStore>,
    catalog: Arc<Catalog>,
}

impl std::fmt::Debug for IssueDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueDetector").finish_non_exhaustive()
    }
}

impl IssueDetector {
    /// Detector over a store, using one catalog snapshot
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Start a scan; each call begins from the first triple
    #[must_use]
    pub fn scan(&self, scope: &ScanScope) -> IssueScan {
        let catalog = Arc::clone(&self.catalog);
        let councils = select(catalog.councils(), &scope.councils, |c| c.slug.as_str());
        let fields = select(catalog.fields(), &scope.fields, |f| f.slug.as_str());
        let years = select(catalog.years(), &scope.years, |y| y.id.as_str());
        IssueScan {
            store: Arc::clone(&self.store),
            catalog,
            councils,
            fields,
            years,
            cursor: 0,
            detected_at: Utc::now(),
        }
    }
}

/// Lazy sequence of issues produced by [`IssueDetector::scan`]
pub struct IssueScan {
    store: Arc<dyn RecordStore>,
    catalog: Arc<Catalog>,
    councils: Vec<usize>,
    fields: Vec<usize>,
    years: Vec<usize>,
    cursor: usize,
    detected_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssueScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueScan")
            .field("cursor", &self.cursor)
            .field("total", &self.total())
            .finish_non_exhaustive()
    }
}

impl IssueScan {
    fn total(&self) -> usize {
        self.councils.len() * self.fields.len() * self.years.len()
    }

    fn examine(
        &self,
        council: &Council,
        field: &Field,
        year: &FinancialYear,
    ) -> Result<Option<Issue>, StoreError> {
        let triple = Triple::new(&council.slug, &field.slug, &year.id);
        let Some(record) = self.store.get(&triple)? else {
            if self.catalog.is_required(field, year) {
                return Ok(Some(self.issue(triple, IssueKind::Missing, None)));
            }
            return Ok(None);
        };

        if field.kind != FieldKind::Number {
            return Ok(None);
        }
        let (Some(rule), Some(value)) = (self.catalog.rule(&field.slug), record.value.as_number())
        else {
            return Ok(None);
        };

        let previous = match self.catalog.previous_year(&year.id) {
            Some(prev) => self
                .store
                .get(&triple.with_year(&prev.id))?
                .and_then(|r| r.value.as_number()),
            None => None,
        };

        Ok(evaluate(rule, value, previous)
            .map(|reason| self.issue(triple, IssueKind::Suspicious, Some(reason))))
    }

    fn issue(&self, triple: Triple, kind: IssueKind, reason: Option<SuspicionReason>) -> Issue {
        Issue {
            triple,
            kind,
            reason,
            detected_at: self.detected_at,
        }
    }
}

impl Iterator for IssueScan {
    type Item = Result<Issue, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let per_council = self.fields.len() * self.years.len();
        while self.cursor < self.total() {
            let i = self.cursor;
            self.cursor += 1;

            let council = &self.catalog.councils()[self.councils[i / per_council]];
            let rest = i % per_council;
            let field = &self.catalog.fields()[self.fields[rest / self.years.len()]];
            let year = &self.catalog.years()[self.years[rest % self.years.len()]];

            match self.examine(council, field, year) {
                Ok(Some(issue)) => return Some(Ok(issue)),
                Ok(None) => {},
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Check one numeric value against a plausibility rule
///
/// `previous` is the same council and field in the preceding year. Rules
/// are checked in order: minimum, maximum, zero-after-non-zero, then
/// year-over-year change; the first failure wins.
#[must_use]
pub fn evaluate(rule: &PlausibilityRule, value: f64, previous: Option<f64>) -> Option<SuspicionReason> {
    if let Some(min) = rule.min
        && value < min
    {
        return Some(SuspicionReason::BelowMinimum { min, value });
    }
    if let Some(max) = rule.max
        && value > max
    {
        return Some(SuspicionReason::AboveMaximum { max, value });
    }

    let previous = previous.filter(|p| p.abs() > f64::EPSILON)?;

    if rule.flag_zero_after_nonzero && value.abs() <= f64::EPSILON {
        return Some(SuspicionReason::ZeroAfterNonZero { previous });
    }
    if let Some(limit_pct) = rule.max_year_over_year_delta_pct {
        let delta_pct = (value - previous).abs() / previous.abs() * 100.0;
        if delta_pct > limit_pct {
            return Some(SuspicionReason::YearOverYearDelta {
                previous,
                value,
                delta_pct,
                limit_pct,
            });
        }
    }
    None
}
