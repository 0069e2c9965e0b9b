//! Schema data model
//!
//! Types shared by every pipeline stage: what a reader observes in a file,
//! and the canonical snapshot that gets cached and diffed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Source file format, fixed per dataset at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Avro,
    Csv,
    Parquet,
}

impl SourceFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "avro" => Some(SourceFormat::Avro),
            "csv" => Some(SourceFormat::Csv),
            "parquet" | "pq" => Some(SourceFormat::Parquet),
            _ => None,
        }
    }

    /// Lowercase name, also the default catalog platform
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Avro => "avro",
            SourceFormat::Csv => "csv",
            SourceFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized type bucket used for cross-format comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    String,
    Integer,
    Float,
    Boolean,
    Other,
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalType::String => "string",
            CanonicalType::Integer => "integer",
            CanonicalType::Float => "float",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Other => "other",
        };
        f.write_str(s)
    }
}

/// One field as observed in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    pub declared_type: CanonicalType,
    /// Source-format type tag, e.g. "long", "int", "Utf8"
    pub native_type: String,
    pub nullable: bool,
}

impl FieldSchema {
    pub fn new(
        name: impl Into<String>,
        declared_type: CanonicalType,
        native_type: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            native_type: native_type.into(),
            nullable,
        }
    }
}

/// Reader output for one file, fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedSchema {
    pub format: SourceFormat,
    pub fields: Vec<FieldSchema>,
    /// Format-level schema text (Avro JSON, Arrow schema), when the format has one
    pub raw_schema: Option<String>,
}

/// Type information kept per field in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    #[serde(rename = "type")]
    pub canonical: CanonicalType,
    pub native_type: String,
}

/// Canonical, order-independent schema of a dataset.
///
/// `None` means the field is known by name only, which is what a legacy
/// names-only cache file yields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub fields: BTreeMap<String, Option<FieldType>>,
}

impl SchemaSnapshot {
    /// Build a snapshot that carries names only
    pub fn names_only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names.into_iter().map(|n| (n.into(), None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical type of a field, if the snapshot knows it
    pub fn type_of(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Compute a fingerprint from the sorted field list
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();

        // BTreeMap iteration is already sorted by name
        for (name, ty) in &self.fields {
            let tag = ty
                .as_ref()
                .map(|t| t.canonical.to_string())
                .unwrap_or_default();
            hasher.update(format!("{}:{};", name, tag).as_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}

impl From<&ObservedSchema> for SchemaSnapshot {
    fn from(observed: &ObservedSchema) -> Self {
        let fields = observed
            .fields
            .iter()
            .map(|f| {
                (
                    f.name.clone(),
                    Some(FieldType {
                        canonical: f.declared_type,
                        native_type: f.native_type.clone(),
                    }),
                )
            })
            .collect();

        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(fields: Vec<FieldSchema>) -> ObservedSchema {
        ObservedSchema {
            format: SourceFormat::Avro,
            fields,
            raw_schema: None,
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.avro")), Some(SourceFormat::Avro));
        assert_eq!(SourceFormat::from_path(Path::new("people.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("t.pq")), Some(SourceFormat::Parquet));
        assert_eq!(SourceFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_checksum_consistency() {
        let a = SchemaSnapshot::from(&observed(vec![
            FieldSchema::new("id", CanonicalType::Integer, "long", false),
            FieldSchema::new("name", CanonicalType::String, "string", true),
        ]));
        // Declaration order must not matter
        let b = SchemaSnapshot::from(&observed(vec![
            FieldSchema::new("name", CanonicalType::String, "string", true),
            FieldSchema::new("id", CanonicalType::Integer, "long", false),
        ]));

        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_checksum_tracks_canonical_type() {
        let a = SchemaSnapshot::from(&observed(vec![FieldSchema::new(
            "id",
            CanonicalType::Integer,
            "int",
            false,
        )]));
        let b = SchemaSnapshot::from(&observed(vec![FieldSchema::new(
            "id",
            CanonicalType::String,
            "string",
            false,
        )]));

        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_names_only_snapshot_has_no_types() {
        let snapshot = SchemaSnapshot::names_only(["a", "b"]);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.fields.contains_key("a"));
        assert!(snapshot.type_of("a").is_none());
    }
}
