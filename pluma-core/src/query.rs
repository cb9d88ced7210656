//! Two-phase plugin query.
//!
//! Phase one builds [`Criteria`] that a record store evaluates natively.
//! Phase two ([`refine`]) runs in memory over the store's result and is the
//! correctness boundary for the `pattern` term.

use crate::record::PluginRecord;
use serde::{Deserialize, Serialize};

/// Structured query request; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginQuery {
    #[serde(rename = "type", default)]
    pub plugin_type: Option<String>,

    /// Substring of the persisted domain string.
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub parse_mode: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,
}

impl PluginQuery {
    /// The pattern term, when it is non-blank.
    pub fn pattern_term(&self) -> Option<&str> {
        non_blank(self.pattern.as_deref())
    }
}

/// Record column a criterion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type,
    Domain,
    ParseMode,
    Name,
    Pattern,
    CreatedBy,
}

impl Field {
    fn value<'a>(&self, record: &'a PluginRecord) -> Option<&'a str> {
        match self {
            Field::Type => Some(&record.plugin_type),
            Field::Domain => Some(&record.domain),
            Field::ParseMode => Some(&record.parse_mode),
            Field::Name => record.name.as_deref(),
            Field::Pattern => Some(&record.pattern),
            Field::CreatedBy => Some(&record.created_by),
        }
    }
}

/// A single store-level predicate clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Equals(Field, String),
    Contains(Field, String),
}

impl Criterion {
    /// Absent columns never match, mirroring SQL `NULL` semantics.
    pub fn matches(&self, record: &PluginRecord) -> bool {
        match self {
            Criterion::Equals(field, expected) => field.value(record) == Some(expected.as_str()),
            Criterion::Contains(field, needle) => field
                .value(record)
                .is_some_and(|value| value.contains(needle.as_str())),
        }
    }
}

/// Conjunction of criteria. An empty set matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    clauses: Vec<Criterion>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, criterion: Criterion) -> Self {
        self.clauses.push(criterion);
        self
    }

    pub fn clauses(&self) -> &[Criterion] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, record: &PluginRecord) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build the store-phase predicate for `query`.
pub fn criteria_for(query: &PluginQuery) -> Criteria {
    let mut criteria = Criteria::new();
    if let Some(v) = non_blank(query.plugin_type.as_deref()) {
        criteria = criteria.and(Criterion::Equals(Field::Type, v.to_string()));
    }
    if let Some(v) = non_blank(query.domain.as_deref()) {
        criteria = criteria.and(Criterion::Contains(Field::Domain, v.to_string()));
    }
    if let Some(v) = non_blank(query.parse_mode.as_deref()) {
        criteria = criteria.and(Criterion::Equals(Field::ParseMode, v.to_string()));
    }
    if let Some(v) = non_blank(query.name.as_deref()) {
        criteria = criteria.and(Criterion::Contains(Field::Name, v.to_string()));
    }
    if let Some(v) = query.pattern_term() {
        criteria = criteria.and(Criterion::Contains(Field::Pattern, v.to_string()));
    }
    if let Some(v) = non_blank(query.created_by.as_deref()) {
        criteria = criteria.and(Criterion::Equals(Field::CreatedBy, v.to_string()));
    }
    criteria
}

/// Memory-phase refinement: with a pattern term, keep records whose pattern
/// or name contains it.
pub fn refine(records: Vec<PluginRecord>, query: &PluginQuery) -> Vec<PluginRecord> {
    let Some(term) = query.pattern_term() else {
        return records;
    };
    records
        .into_iter()
        .filter(|record| {
            record.pattern.contains(term)
                || record.name.as_deref().is_some_and(|name| name.contains(term))
        })
        .collect()
}

/// Apply both phases to an in-memory record set.
pub fn run(records: Vec<PluginRecord>, query: &PluginQuery) -> Vec<PluginRecord> {
    let criteria = criteria_for(query);
    let scanned = records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect();
    refine(scanned, query)
}
