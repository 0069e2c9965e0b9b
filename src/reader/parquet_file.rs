//! Parquet reader
//!
//! Column types are exact: they come from the Arrow schema stored in (or
//! derived from) the file footer, so no data pages are decoded.

use super::SchemaReader;
use crate::error::{source_error, IngestResult};
use crate::models::{FieldSchema, ObservedSchema, SourceFormat};
use crate::normalize;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub struct ParquetSchemaReader;

impl SchemaReader for ParquetSchemaReader {
    fn read(&self, path: &Path) -> IngestResult<ObservedSchema> {
        let file = File::open(path).map_err(|e| source_error(path, e))?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| source_error(path, e))?;

        debug!(
            "Parquet footer for {}: {} rows in {} row groups",
            path.display(),
            builder.metadata().file_metadata().num_rows(),
            builder.metadata().num_row_groups()
        );

        let schema = builder.schema();
        let fields = schema
            .fields()
            .iter()
            .map(|field| {
                let data_type = field.data_type();
                FieldSchema::new(
                    field.name(),
                    normalize::from_arrow(data_type),
                    data_type.to_string(),
                    field.is_nullable(),
                )
            })
            .collect();

        Ok(ObservedSchema {
            format: SourceFormat::Parquet,
            fields,
            raw_schema: Some(schema.to_string()),
        })
    }
}
