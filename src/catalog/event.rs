//! Metadata Change Events
//!
//! DataHub's Pegasus wire model for a dataset snapshot, reduced to the two
//! aspects this tool produces: `DatasetProperties` and `SchemaMetadata`.
//! Union members serialize as single-key objects named by their fully
//! qualified Pegasus type, which is what the REST ingestion endpoint expects.

use crate::models::{CanonicalType, ObservedSchema, SourceFormat};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const UNKNOWN_ACTOR: &str = "urn:li:corpuser:unknown";

/// Dataset identifier: platform + name + environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUrn {
    pub platform: String,
    pub name: String,
    pub env: String,
}

impl DatasetUrn {
    pub fn new(platform: impl Into<String>, name: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            name: name.into(),
            env: env.into(),
        }
    }

    pub fn platform_urn(&self) -> String {
        format!("urn:li:dataPlatform:{}", self.platform)
    }
}

impl fmt::Display for DatasetUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urn:li:dataset:({},{},{})",
            self.platform_urn(),
            self.name,
            self.env
        )
    }
}

/// Top-level change event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataChangeEvent {
    pub proposed_snapshot: ProposedSnapshot,
}

impl MetadataChangeEvent {
    /// Request body for `POST /entities?action=ingest`
    pub fn ingest_body(&self) -> serde_json::Value {
        serde_json::json!({ "entity": { "value": self.proposed_snapshot } })
    }

    pub fn urn(&self) -> &str {
        match &self.proposed_snapshot {
            ProposedSnapshot::Dataset(snapshot) => &snapshot.urn,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ProposedSnapshot {
    #[serde(rename = "com.linkedin.metadata.snapshot.DatasetSnapshot")]
    Dataset(DatasetSnapshot),
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSnapshot {
    pub urn: String,
    pub aspects: Vec<DatasetAspect>,
}

#[derive(Debug, Clone, Serialize)]
pub enum DatasetAspect {
    #[serde(rename = "com.linkedin.dataset.DatasetProperties")]
    Properties(DatasetProperties),
    #[serde(rename = "com.linkedin.schema.SchemaMetadata")]
    Schema(SchemaMetadata),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProperties {
    pub description: String,
    pub custom_properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStamp {
    pub time: i64,
    pub actor: String,
}

impl AuditStamp {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time: time.timestamp_millis(),
            actor: UNKNOWN_ACTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    pub schema_name: String,
    pub platform: String,
    pub version: i64,
    pub created: AuditStamp,
    pub last_modified: AuditStamp,
    pub hash: String,
    pub platform_schema: PlatformSchema,
    pub fields: Vec<SchemaField>,
    pub dataset: String,
    pub cluster: String,
}

#[derive(Debug, Clone, Serialize)]
pub enum PlatformSchema {
    #[serde(rename = "com.linkedin.schema.OtherSchema")]
    Other {
        #[serde(rename = "rawSchema")]
        raw_schema: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub field_path: String,
    #[serde(rename = "type")]
    pub data_type: SchemaFieldDataType,
    pub native_data_type: String,
    pub description: String,
    pub nullable: bool,
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaFieldDataType {
    #[serde(rename = "type")]
    pub kind: FieldDataType,
}

/// Catalog-side type buckets. Integer and Float share `NumberType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldDataType {
    #[serde(rename = "com.linkedin.schema.StringType")]
    String {},
    #[serde(rename = "com.linkedin.schema.NumberType")]
    Number {},
    #[serde(rename = "com.linkedin.schema.BooleanType")]
    Boolean {},
}

impl From<CanonicalType> for FieldDataType {
    fn from(canonical: CanonicalType) -> Self {
        match canonical {
            CanonicalType::Integer | CanonicalType::Float => FieldDataType::Number {},
            CanonicalType::Boolean => FieldDataType::Boolean {},
            CanonicalType::String | CanonicalType::Other => FieldDataType::String {},
        }
    }
}

/// Static properties of one dataset, as configured
#[derive(Debug, Clone)]
pub struct DatasetDescriptor<'a> {
    pub name: &'a str,
    pub source_path: &'a Path,
    pub format: SourceFormat,
    pub description: Option<&'a str>,
}

/// Builds change events for one catalog platform/environment pairing
#[derive(Debug, Clone)]
pub struct EventBuilder {
    platform: Option<String>,
    env: String,
}

impl EventBuilder {
    /// `platform` overrides the per-format default when set
    pub fn new(platform: Option<String>, env: impl Into<String>) -> Self {
        Self {
            platform,
            env: env.into(),
        }
    }

    pub fn urn_for(&self, name: &str, format: SourceFormat) -> DatasetUrn {
        let platform = self
            .platform
            .clone()
            .unwrap_or_else(|| format.as_str().to_string());
        DatasetUrn::new(platform, name, self.env.clone())
    }

    /// Build the change event for an observed schema.
    ///
    /// `hash` is the snapshot fingerprint; `at` stamps both `created` and
    /// `lastModified`.
    pub fn build(
        &self,
        dataset: &DatasetDescriptor<'_>,
        observed: &ObservedSchema,
        hash: &str,
        at: DateTime<Utc>,
    ) -> MetadataChangeEvent {
        let urn = self.urn_for(dataset.name, dataset.format);
        let format_label = dataset.format.as_str().to_uppercase();

        let description = dataset.description.map(str::to_string).unwrap_or_else(|| {
            format!(
                "Dataset '{}' ingested from {} file.",
                dataset.name, format_label
            )
        });

        let mut custom_properties = BTreeMap::new();
        custom_properties.insert(
            "source_path".to_string(),
            dataset.source_path.display().to_string(),
        );
        custom_properties.insert("source_format".to_string(), dataset.format.to_string());

        let fields = observed
            .fields
            .iter()
            .map(|f| SchemaField {
                field_path: f.name.clone(),
                data_type: SchemaFieldDataType {
                    kind: f.declared_type.into(),
                },
                native_data_type: f.native_type.clone(),
                description: format!("Field from {}: {}", format_label, f.name),
                nullable: f.nullable,
                recursive: false,
            })
            .collect();

        let stamp = AuditStamp::at(at);
        let schema = SchemaMetadata {
            schema_name: dataset.name.to_string(),
            platform: urn.platform_urn(),
            version: 0,
            created: stamp.clone(),
            last_modified: stamp,
            hash: hash.to_string(),
            platform_schema: PlatformSchema::Other {
                raw_schema: observed.raw_schema.clone().unwrap_or_default(),
            },
            fields,
            dataset: urn.to_string(),
            cluster: self.env.clone(),
        };

        MetadataChangeEvent {
            proposed_snapshot: ProposedSnapshot::Dataset(DatasetSnapshot {
                urn: urn.to_string(),
                aspects: vec![
                    DatasetAspect::Properties(DatasetProperties {
                        description,
                        custom_properties,
                    }),
                    DatasetAspect::Schema(schema),
                ],
            }),
        }
    }
}
