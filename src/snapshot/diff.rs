//! Schema Diff Engine
//!
//! Compares a cached snapshot against a freshly observed one. Pure set
//! arithmetic over field names; no I/O and no ordering dependence.

use crate::models::SchemaSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Field-level classification of drift between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    /// Fields present only in the new snapshot
    pub added: BTreeSet<String>,
    /// Fields present only in the old snapshot
    pub removed: BTreeSet<String>,
    /// Fields in both whose canonical type differs
    pub changed_type: BTreeSet<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed_type.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed_type.len()
    }
}

/// Outcome of comparing a dataset against its cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    /// No cached snapshot existed
    FirstIngest,
    /// Cache existed and matches
    Unchanged,
    Changed(SchemaDiff),
    /// Cache existed but could not be read; no comparison was made
    CacheUnavailable,
}

impl DriftStatus {
    /// Classify a diff result against an optional baseline
    pub fn classify(old: Option<&SchemaSnapshot>, new: &SchemaSnapshot) -> Self {
        match old {
            None => DriftStatus::FirstIngest,
            Some(old) => {
                let diff = DiffEngine::diff(old, new);
                if diff.is_empty() {
                    DriftStatus::Unchanged
                } else {
                    DriftStatus::Changed(diff)
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DriftStatus::FirstIngest => "first_ingest",
            DriftStatus::Unchanged => "unchanged",
            DriftStatus::Changed(_) => "changed",
            DriftStatus::CacheUnavailable => "cache_unavailable",
        }
    }
}

/// The diff engine that compares schema snapshots
pub struct DiffEngine;

impl DiffEngine {
    /// Compare two snapshots and classify every differing field
    pub fn diff(old: &SchemaSnapshot, new: &SchemaSnapshot) -> SchemaDiff {
        let old_keys: BTreeSet<&str> = old.fields.keys().map(String::as_str).collect();
        let new_keys: BTreeSet<&str> = new.fields.keys().map(String::as_str).collect();

        let added = new_keys
            .difference(&old_keys)
            .map(|name| name.to_string())
            .collect();

        let removed = old_keys
            .difference(&new_keys)
            .map(|name| name.to_string())
            .collect();

        // Names-only snapshots never report type changes
        let changed_type = old_keys
            .intersection(&new_keys)
            .filter(|name| match (old.type_of(name), new.type_of(name)) {
                (Some(before), Some(after)) => before.canonical != after.canonical,
                _ => false,
            })
            .map(|name| name.to_string())
            .collect();

        SchemaDiff {
            added,
            removed,
            changed_type,
        }
    }
}
