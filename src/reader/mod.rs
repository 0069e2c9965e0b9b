//! Schema Reader Module
//!
//! One `SchemaReader` per source format. The format is chosen once per
//! dataset and dispatched here; every reader returns the same
//! `ObservedSchema` shape with fields in declaration order.

pub mod avro_file;
pub mod csv_file;
pub mod parquet_file;

pub use avro_file::AvroSchemaReader;
pub use csv_file::CsvSchemaReader;
pub use parquet_file::ParquetSchemaReader;

use crate::error::{malformed_error, IngestResult};
use crate::models::{ObservedSchema, SourceFormat};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Extracts a flat field schema from a source file
pub trait SchemaReader {
    fn read(&self, path: &Path) -> IngestResult<ObservedSchema>;
}

/// Pick the reader for a format
pub fn reader_for(format: SourceFormat) -> &'static (dyn SchemaReader + Send + Sync) {
    match format {
        SourceFormat::Avro => &AvroSchemaReader,
        SourceFormat::Csv => &CsvSchemaReader,
        SourceFormat::Parquet => &ParquetSchemaReader,
    }
}

/// Read a file's schema and enforce unique field names
pub fn read_schema(format: SourceFormat, path: &Path) -> IngestResult<ObservedSchema> {
    let observed = reader_for(format).read(path)?;

    let mut seen = HashSet::with_capacity(observed.fields.len());
    for field in &observed.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(malformed_error(
                path,
                format!("duplicate field name '{}'", field.name),
            ));
        }
    }

    debug!(
        "Read {} schema from {}: {} fields",
        format,
        path.display(),
        observed.fields.len()
    );

    Ok(observed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;

    #[test]
    fn test_duplicate_csv_headers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        std::fs::write(&path, "id,name,id\n1,a,2\n").unwrap();

        let err = read_schema(SourceFormat::Csv, &path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedInput { .. }));
        assert!(err.to_string().contains("duplicate field name 'id'"));
    }

    #[test]
    fn test_missing_file_is_source_error_for_every_format() {
        let dir = tempfile::tempdir().unwrap();
        for format in [SourceFormat::Avro, SourceFormat::Csv, SourceFormat::Parquet] {
            let path = dir.path().join(format!("missing.{}", format));
            let err = read_schema(format, &path).unwrap_err();
            assert_eq!(err.kind(), "SOURCE_READ", "format {}", format);
        }
    }
}
