//! Schema Snapshot Cache
//!
//! Keeps the last observed snapshot of each dataset as a small JSON file,
//! one file per dataset name. The cache always reflects the last run, not
//! the last change.

use crate::error::{cache_error, IngestResult};
use crate::models::{FieldType, SchemaSnapshot};
use crate::normalize;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// On-disk forms accepted when loading
#[derive(Deserialize)]
#[serde(untagged)]
enum CachedSnapshot {
    Typed(SchemaSnapshot),
    /// Older CSV caches stored a sorted list of field names only
    Names(Vec<String>),
    /// Older Avro caches stored field name -> Avro type, either a name or
    /// the type's JSON schema
    AvroTags(BTreeMap<String, Value>),
}

impl From<CachedSnapshot> for SchemaSnapshot {
    fn from(cached: CachedSnapshot) -> Self {
        match cached {
            CachedSnapshot::Typed(snapshot) => snapshot,
            CachedSnapshot::Names(names) => SchemaSnapshot::names_only(names),
            CachedSnapshot::AvroTags(tags) => SchemaSnapshot {
                fields: tags
                    .into_iter()
                    .map(|(name, value)| {
                        let tag = legacy_avro_tag(&value);
                        let ty = FieldType {
                            canonical: normalize::from_avro(&tag),
                            native_type: tag,
                        };
                        (name, Some(ty))
                    })
                    .collect(),
            },
        }
    }
}

/// Avro type name of a legacy cache entry.
///
/// Complex types carry their name under `"type"`; unions resolve to their
/// first non-null branch.
fn legacy_avro_tag(value: &Value) -> String {
    match value {
        Value::String(tag) => tag.clone(),
        Value::Object(schema) => schema
            .get("type")
            .map(legacy_avro_tag)
            .unwrap_or_else(|| "other".to_string()),
        Value::Array(branches) => branches
            .iter()
            .map(legacy_avro_tag)
            .find(|tag| tag != "null")
            .unwrap_or_else(|| "null".to_string()),
        _ => "other".to_string(),
    }
}

/// File-backed store for schema snapshots
pub struct SchemaCache {
    dir: PathBuf,
}

impl SchemaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a dataset
    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{}.json", dataset))
    }

    /// Load the previous snapshot; `None` on first ingest
    pub fn load(&self, dataset: &str) -> IngestResult<Option<SchemaSnapshot>> {
        let path = self.path_for(dataset);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(cache_error(&path, e)),
        };

        let cached: CachedSnapshot =
            serde_json::from_str(&content).map_err(|e| cache_error(&path, e))?;

        Ok(Some(cached.into()))
    }

    /// Overwrite the snapshot for a dataset.
    ///
    /// Writes a sibling temp file first and renames it into place, so a
    /// reader never sees a half-written snapshot.
    pub fn store(&self, dataset: &str, snapshot: &SchemaSnapshot) -> IngestResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| cache_error(&self.dir, e))?;

        let path = self.path_for(dataset);
        let tmp = self.dir.join(format!(".{}.json.tmp", dataset));

        let mut body = serde_json::to_string_pretty(snapshot).map_err(|e| cache_error(&path, e))?;
        body.push('\n');

        fs::write(&tmp, body).map_err(|e| cache_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| cache_error(&path, e))?;

        tracing::debug!(
            "Stored snapshot for {}: {} fields ({})",
            dataset,
            snapshot.len(),
            path.display()
        );

        Ok(path)
    }

    /// Dataset names that currently have a cache entry, sorted
    pub fn list(&self) -> IngestResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(cache_error(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| cache_error(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
