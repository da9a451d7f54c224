//! Shared test fixtures and helpers
//!
//! This module provides a small catalog, a set of users at each tier, and
//! port mocks for exercising failure paths of the engine.


use std::collections::BTreeMap;

use civic_ledger::adapters::MemoryBackend;
use civic_ledger::core::models::{
    Catalog, CatalogHandle, Council, Field, FieldCategory, FieldKind, FieldValue,
    PlausibilityRule, Sensitivity, Triple, User,
};
use civic_ledger::core::services::{EngineSettings, ModerationEngine};

pub const YEARS: [&str; 3] = ["2021-22", "2022-23", "2023-24"];
pub const CURRENT: &str = "2023-24";

fn council(slug: &str, name: &str) -> Council {
    Council {
        slug: slug.to_string(),
        name: name.to_string(),
        council_type: Some("unitary".to_string()),
        nation: None,
    }
}

fn field(
    slug: &str,
    kind: FieldKind,
    sensitivity: Sensitivity,
    required: bool,
    required_since: Option<&str>,
) -> Field {
    Field {
        slug: slug.to_string(),
        name: slug.replace('-', " "),
        category: FieldCategory::Financial,
        kind,
        sensitivity,
        required,
        required_since: required_since.map(str::to_string),
    }
}

/// Two councils, three years and four fields:
///
/// - `total-debt`: number, open, required, min 0, 50% year-over-year limit
/// - `usable-reserves`: number, moderated, required from 2022-23, min 0
/// - `band-d`: number, restricted
/// - `chief-executive`: text, moderated
pub fn catalog() -> Catalog {
    let mut rules = BTreeMap::new();
    rules.insert(
        "total-debt".to_string(),
        PlausibilityRule {
            min: Some(0.0),
            max: None,
            max_year_over_year_delta_pct: Some(50.0),
            flag_zero_after_nonzero: true,
        },
    );
    rules.insert(
        "usable-reserves".to_string(),
        PlausibilityRule {
            min: Some(0.0),
            ..PlausibilityRule::default()
        },
    );

    Catalog::new(
        vec![council("council-a", "Council A"), council("council-b", "Council B")],
        YEARS.iter().map(|y| (*y).to_string()).collect(),
        vec![
            field("total-debt", FieldKind::Number, Sensitivity::Open, true, None),
            field("usable-reserves", FieldKind::Number, Sensitivity::Moderated, true, Some("2022-23")),
            field("band-d", FieldKind::Number, Sensitivity::Restricted, false, None),
            field("chief-executive", FieldKind::Text, Sensitivity::Moderated, false, None),
        ],
        rules,
        Some(CURRENT.to_string()),
    )
}

/// Fresh in-memory stores plus an engine over them
pub fn engine() -> (ModerationEngine, MemoryBackend) {
    engine_with(EngineSettings::default())
}

/// Like [`engine`], with explicit settings
pub fn engine_with(settings: EngineSettings) -> (ModerationEngine, MemoryBackend) {
    let backend = MemoryBackend::new();
    let engine = backend.engine(CatalogHandle::new(catalog()), settings);
    (engine, backend)
}

pub fn triple(council: &str, field: &str, year: &str) -> Triple {
    Triple::new(council, field, year)
}

pub fn debt(year: &str) -> Triple {
    triple("council-a", "total-debt", year)
}

pub fn reserves(year: &str) -> Triple {
    triple("council-a", "usable-reserves", year)
}

pub fn band_d(year: &str) -> Triple {
    triple("council-a", "band-d", year)
}

pub fn num(n: f64) -> FieldValue {
    FieldValue::Number(n)
}

pub fn guest() -> User {
    User::new("guest", 0)
}

pub fn alice() -> User {
    User::new("alice", 1)
}

pub fn bob() -> User {
    User::new("bob", 1)
}

pub fn reviewer() -> User {
    User::new("rita", 3)
}

pub fn senior() -> User {
    User::new("sam", 5)
}

pub fn root() -> User {
    User::superuser("root")
}
