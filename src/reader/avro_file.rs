//! Avro object container reader
//!
//! Only the embedded writer schema is read; no records are decoded.

use super::SchemaReader;
use crate::error::{source_error, IngestResult};
use crate::models::{FieldSchema, ObservedSchema, SourceFormat};
use crate::normalize;
use apache_avro::{Reader, Schema};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

pub struct AvroSchemaReader;

impl SchemaReader for AvroSchemaReader {
    fn read(&self, path: &Path) -> IngestResult<ObservedSchema> {
        let file = File::open(path).map_err(|e| source_error(path, e))?;
        let reader = Reader::new(BufReader::new(file)).map_err(|e| source_error(path, e))?;
        let schema = reader.writer_schema();

        let record = match schema {
            Schema::Record(record) => record,
            other => {
                return Err(source_error(
                    path,
                    format!(
                        "top-level schema is '{}', expected a record",
                        type_name(other)
                    ),
                ))
            }
        };

        let fields = record
            .fields
            .iter()
            .map(|field| {
                let (resolved, nullable) = resolve_union(&field.schema);
                let tag = type_name(resolved);
                FieldSchema::new(&field.name, normalize::from_avro(tag), tag, nullable)
            })
            .collect();

        Ok(ObservedSchema {
            format: SourceFormat::Avro,
            fields,
            raw_schema: raw_json(schema, path),
        })
    }
}

/// JSON text of the writer schema; a failure only loses the raw copy
fn raw_json<T: Serialize + ?Sized>(schema: &T, path: &Path) -> Option<String> {
    match serde_json::to_string(schema) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("⚠️  Cannot serialize Avro schema of {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve `["null", T]` style unions to their first non-null member.
///
/// Returns the resolved schema and whether `null` was one of the branches.
fn resolve_union(schema: &Schema) -> (&Schema, bool) {
    match schema {
        Schema::Union(union) => {
            let nullable = union.variants().iter().any(|s| matches!(s, Schema::Null));
            let first = union
                .variants()
                .iter()
                .find(|s| !matches!(s, Schema::Null))
                .unwrap_or(schema);
            (first, nullable)
        }
        Schema::Null => (schema, true),
        _ => (schema, false),
    }
}

/// Avro spelling of a schema's type
fn type_name(schema: &Schema) -> &'static str {
    match schema {
        Schema::Null => "null",
        Schema::Boolean => "boolean",
        Schema::Int => "int",
        Schema::Long => "long",
        Schema::Float => "float",
        Schema::Double => "double",
        Schema::Bytes => "bytes",
        Schema::String => "string",
        Schema::Array(_) => "array",
        Schema::Map(_) => "map",
        Schema::Union(_) => "union",
        Schema::Record(_) => "record",
        Schema::Enum(_) => "enum",
        Schema::Fixed(_) => "fixed",
        Schema::Decimal(_) => "decimal",
        Schema::Uuid => "uuid",
        Schema::Date => "date",
        Schema::TimeMillis => "time-millis",
        Schema::TimeMicros => "time-micros",
        Schema::TimestampMillis => "timestamp-millis",
        Schema::TimestampMicros => "timestamp-micros",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalType;
    use apache_avro::types::{Record, Value};
    use apache_avro::Writer;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const USER_SCHEMA: &str = r#"
    {
        "type": "record",
        "name": "User",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "email", "type": ["null", "string"]},
            {"name": "salary", "type": ["null", "double"]},
            {"name": "active", "type": "boolean"},
            {"name": "tags", "type": {"type": "array", "items": "string"}}
        ]
    }
    "#;

    fn write_users(dir: &Path) -> PathBuf {
        let schema = Schema::parse_str(USER_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());

        let mut record = Record::new(writer.schema()).unwrap();
        record.put("id", 1i64);
        record.put("email", Value::Union(1, Box::new(Value::String("a@example.com".into()))));
        record.put("salary", Value::Union(0, Box::new(Value::Null)));
        record.put("active", true);
        record.put("tags", Value::Array(vec![Value::String("x".into())]));
        writer.append(record).unwrap();

        let path = dir.join("users.avro");
        std::fs::write(&path, writer.into_inner().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_reads_fields_in_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(dir.path());

        let observed = AvroSchemaReader.read(&path).unwrap();
        let names: Vec<_> = observed.fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(observed.format, SourceFormat::Avro);
        assert_eq!(names, vec!["id", "email", "salary", "active", "tags"]);
        assert!(observed.raw_schema.unwrap().contains("\"User\""));
    }

    #[test]
    fn test_nullable_union_resolves_to_first_non_null_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(dir.path());

        let observed = AvroSchemaReader.read(&path).unwrap();
        let email = &observed.fields[1];

        assert_eq!(email, &FieldSchema::new("email", CanonicalType::String, "string", true));
    }

    #[test]
    fn test_primitive_and_opaque_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_users(dir.path());

        let observed = AvroSchemaReader.read(&path).unwrap();

        assert_eq!(
            observed.fields,
            vec![
                FieldSchema::new("id", CanonicalType::Integer, "long", false),
                FieldSchema::new("email", CanonicalType::String, "string", true),
                FieldSchema::new("salary", CanonicalType::Float, "double", true),
                FieldSchema::new("active", CanonicalType::Boolean, "boolean", false),
                FieldSchema::new("tags", CanonicalType::Other, "array", false),
            ]
        );
    }

    #[test]
    fn test_non_container_file_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.avro");
        std::fs::write(&path, b"definitely not avro").unwrap();

        let err = AvroSchemaReader.read(&path).unwrap_err();
        assert_eq!(err.kind(), "SOURCE_READ");
    }

    #[test]
    fn test_resolve_union_without_null() {
        let schema = Schema::parse_str(r#"["int", "string"]"#).unwrap();
        let (resolved, nullable) = resolve_union(&schema);

        assert_eq!(type_name(resolved), "int");
        assert!(!nullable);
    }

    #[test]
    fn test_unserializable_schema_keeps_raw_copy_empty() {
        let path = PathBuf::from("users.avro");
        let mut keyed = std::collections::BTreeMap::new();
        keyed.insert(vec![1u8, 2], 1);

        assert_eq!(raw_json(&keyed, &path), None);
        assert_eq!(raw_json(&["id"], &path).as_deref(), Some(r#"["id"]"#));
    }
}
