//! CSV reader
//!
//! Field names come from the header row; types come from exactly one sample
//! row. A column whose first value is all digits is an integer column even if
//! later rows disagree.

use super::SchemaReader;
use crate::error::{malformed_error, source_error, IngestResult};
use crate::models::{FieldSchema, ObservedSchema, SourceFormat};
use crate::normalize;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

pub struct CsvSchemaReader;

impl SchemaReader for CsvSchemaReader {
    fn read(&self, path: &Path) -> IngestResult<ObservedSchema> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| source_error(path, e))?;

        let headers = reader.headers().map_err(|e| source_error(path, e))?.clone();
        if headers.iter().all(str::is_empty) {
            return Err(malformed_error(path, "no header row"));
        }

        let mut sample = StringRecord::new();
        let has_row = reader
            .read_record(&mut sample)
            .map_err(|e| source_error(path, e))?;
        if !has_row {
            return Err(malformed_error(path, "no data rows after header"));
        }

        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let tag = normalize::csv_native_tag(sample.get(i).unwrap_or(""));
                FieldSchema::new(name, normalize::from_csv(tag), tag, true)
            })
            .collect();

        Ok(ObservedSchema {
            format: SourceFormat::Csv,
            fields,
            raw_schema: None,
        })
    }
}
