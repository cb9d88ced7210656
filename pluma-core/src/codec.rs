//! Conversion between [`Plugin`] and its storage form [`PluginRecord`].
//!
//! The comma-joined domain string never leaves this module: callers see
//! `Vec<i64>` on the domain side and `PluginRecord::domain` on the store side.

use crate::error::PlumaError;
use crate::plugin::{Caller, ParseMode, Plugin, PluginSpec};
use crate::record::PluginRecord;
use chrono::{DateTime, Utc};

const DOMAIN_SEPARATOR: char = ',';

/// Join domain ids into their persisted form. An empty list yields `""`.
pub fn join_domains(domains: &[i64]) -> String {
    domains
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a persisted domain string. Blank input yields an empty list.
pub fn parse_domains(raw: &str) -> Result<Vec<i64>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(DOMAIN_SEPARATOR)
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| format!("invalid domain id '{token}'"))
        })
        .collect()
}

/// Build a fresh storage record for `spec`, stamping both audit pairs.
pub fn to_storage(spec: &PluginSpec, caller: &Caller, now: DateTime<Utc>) -> PluginRecord {
    PluginRecord {
        id: None,
        name: spec.name.clone(),
        plugin_type: spec.plugin_type.clone(),
        domain: join_domains(&spec.domain_list),
        pattern: spec.pattern.clone(),
        parse_mode: spec.parse_mode.as_str().to_string(),
        parse_mode_config: spec.parse_mode_config.clone(),
        contains_all_domain: spec.contains_all_domain,
        config: spec.config.clone(),
        comment: spec.comment.clone(),
        created_by: caller.name.clone(),
        created_at: now,
        updated_by: caller.name.clone(),
        updated_at: now,
    }
}

/// Overwrite every mutable field of `existing` with `spec`.
///
/// `id` and the create audit pair are kept; the update audit pair is
/// re-stamped.
pub fn apply_update(
    existing: PluginRecord,
    spec: &PluginSpec,
    caller: &Caller,
    now: DateTime<Utc>,
) -> PluginRecord {
    PluginRecord {
        id: existing.id,
        created_by: existing.created_by,
        created_at: existing.created_at,
        ..to_storage(spec, caller, now)
    }
}

/// Convert a stored record into the domain model.
pub fn to_domain(record: &PluginRecord) -> Result<Plugin, PlumaError> {
    let malformed = |reason: String| PlumaError::MalformedRecord {
        id: record.id,
        reason,
    };

    let id = record
        .id
        .ok_or_else(|| malformed("record has no id".to_string()))?;
    let domain_list = parse_domains(&record.domain).map_err(malformed)?;
    let parse_mode = record.parse_mode.parse::<ParseMode>().map_err(malformed)?;

    Ok(Plugin {
        id,
        name: record.name.clone(),
        plugin_type: record.plugin_type.clone(),
        pattern: record.pattern.clone(),
        parse_mode,
        parse_mode_config: record.parse_mode_config.clone(),
        domain_list,
        contains_all_domain: record.contains_all_domain,
        config: record.config.clone(),
        comment: record.comment.clone(),
        created_by: record.created_by.clone(),
        created_at: record.created_at,
        updated_by: record.updated_by.clone(),
        updated_at: record.updated_at,
    })
}

/// Convert a batch, failing on the first malformed record.
pub fn to_domain_list(records: &[PluginRecord]) -> Result<Vec<Plugin>, PlumaError> {
    records.iter().map(to_domain).collect()
}
