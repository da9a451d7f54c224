//! The catalog of reference data and plausibility rules
//!
//! A [`Catalog`] is an immutable snapshot. [`CatalogHandle`] lets the host
//! swap in a new snapshot (e.g. after a config reload) while operations in
//! flight keep using the one they started with.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::{Council, Field, FinancialYear};

/// Numeric plausibility thresholds for one field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlausibilityRule {
    /// Smallest plausible value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Largest plausible value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Largest plausible change from the previous year, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year_over_year_delta_pct: Option<f64>,

    /// Flag a zero that follows a non-zero previous year
    #[serde(default = "default_true")]
    pub flag_zero_after_nonzero: bool,
}

const fn default_true() -> bool {
    true
}

/// Councils, years and fields known to the engine
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    councils: Vec<Council>,
    years: Vec<FinancialYear>,
    fields: Vec<Field>,
    rules: BTreeMap<String, PlausibilityRule>,
    current_year: Option<String>,
}

impl Catalog {
    /// Assemble a catalog; `years` are given oldest first
    ///
    /// Validation happens in the config layer; this constructor only
    /// assigns year positions.
    #[must_use]
    pub fn new(
        councils: Vec<Council>,
        years: Vec<String>,
        fields: Vec<Field>,
        rules: BTreeMap<String, PlausibilityRule>,
        current_year: Option<String>,
    ) -> Self {
        let years = years
            .into_iter()
            .enumerate()
            .map(|(position, id)| FinancialYear { id, position })
            .collect();
        Self {
            councils,
            years,
            fields,
            rules,
            current_year,
        }
    }

    /// All councils, in configuration order
    #[must_use]
    pub fn councils(&self) -> &[Council] {
        &self.councils
    }

    /// All years, oldest first
    #[must_use]
    pub fn years(&self) -> &[FinancialYear] {
        &self.years
    }

    /// All fields, in configuration order
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a council by slug
    #[must_use]
    pub fn council(&self, slug: &str) -> Option<&Council> {
        self.councils.iter().find(|c| c.slug == slug)
    }

    /// Look up a field by slug
    #[must_use]
    pub fn field(&self, slug: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.slug == slug)
    }

    /// Look up a year by id
    #[must_use]
    pub fn year(&self, id: &str) -> Option<&FinancialYear> {
        self.years.iter().find(|y| y.id == id)
    }

    /// The year immediately before `id`, if any
    #[must_use]
    pub fn previous_year(&self, id: &str) -> Option<&FinancialYear> {
        let position = self.year(id)?.position;
        position.checked_sub(1).and_then(|p| self.years.get(p))
    }

    /// The distinguished "current" year pointer
    #[must_use]
    pub fn current_year(&self) -> Option<&FinancialYear> {
        self.current_year.as_deref().and_then(|id| self.year(id))
    }

    /// Plausibility rule for a field, if one is configured
    #[must_use]
    pub fn rule(&self, field: &str) -> Option<&PlausibilityRule> {
        self.rules.get(field)
    }

    /// Whether a missing value for `field` in `year` is an issue
    #[must_use]
    pub fn is_required(&self, field: &Field, year: &FinancialYear) -> bool {
        if !field.required {
            return false;
        }
        match field.required_since.as_deref().and_then(|id| self.year(id)) {
            Some(since) => year.position >= since.position,
            None => true,
        }
    }
}

/// Shared, swappable reference to the active catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    /// Wrap a catalog
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// The catalog in effect right now
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        // The guarded value is a whole Arc swapped atomically, so a poisoned
        // lock still holds a consistent catalog.
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the catalog for all later operations
    pub fn replace(&self, catalog: Catalog) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
    }
}
