//! Orchestrator - runs the ingestion pipeline over every configured dataset
//!
//! Datasets are processed one at a time, in configured order. Each one runs
//! inside its own span and its errors stay with it: the batch always
//! continues to the next dataset.

use crate::catalog::{DatasetDescriptor, EventBuilder, MetadataEmitter};
use crate::config::{DatasetConfig, Settings};
use crate::error::{source_error, IngestError, IngestResult};
use crate::models::{ObservedSchema, SchemaSnapshot, SourceFormat};
use crate::pipeline::types::{DatasetOutcome, RunSummary};
use crate::reader::read_schema;
use crate::report::ReportGenerator;
use crate::snapshot::{DriftStatus, SchemaCache, SchemaDiff};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Ingestion pipeline bound to one emitter
pub struct Orchestrator<E> {
    cache: SchemaCache,
    reports: ReportGenerator,
    events: EventBuilder,
    emitter: E,
    processing_timeout: Option<Duration>,
    run_id: Uuid,
}

impl<E: MetadataEmitter> Orchestrator<E> {
    pub fn new(settings: &Settings, emitter: E) -> Self {
        Self {
            cache: SchemaCache::new(&settings.cache_dir),
            reports: ReportGenerator::new(
                &settings.report_dir,
                settings.open_reports,
                settings.viewer_command.clone(),
            ),
            events: EventBuilder::new(settings.platform.clone(), settings.env.clone()),
            emitter,
            processing_timeout: settings.processing_timeout(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Process every dataset and summarize
    pub async fn run(&self, datasets: &[DatasetConfig]) -> RunSummary {
        let mut summary = RunSummary::new(self.run_id);

        for dataset in datasets {
            let span = info_span!("dataset", dataset = %dataset.name, run_id = %self.run_id);

            match self.process(dataset).instrument(span.clone()).await {
                Ok(outcome) => summary.succeeded.push(outcome),
                Err(e) => {
                    span.in_scope(|| {
                        error!(kind = e.kind(), "❌ Dataset {} failed: {}", dataset.name, e);
                    });
                    summary.record_failure(&dataset.name, &e);
                }
            }
        }

        summary.log();
        summary
    }

    /// Run the full pipeline for a single dataset
    pub async fn process(&self, dataset: &DatasetConfig) -> IngestResult<DatasetOutcome> {
        let started = Instant::now();
        let format = dataset
            .resolved_format()
            .map_err(|e| source_error(&dataset.path, e))?;

        info!("🚀 Processing {} ({}) from {}", dataset.name, format, dataset.path.display());

        let observed = self.observe(format, &dataset.path).await?;
        let snapshot = SchemaSnapshot::from(&observed);
        if snapshot.is_empty() {
            warn!("⚠️  {} declares no fields", dataset.path.display());
        } else {
            debug!("Observed {} fields", snapshot.len());
        }

        let (status, previous) = match self.cache.load(&dataset.name) {
            Ok(previous) => (DriftStatus::classify(previous.as_ref(), &snapshot), previous),
            Err(e) => {
                warn!(kind = e.kind(), "⚠️  {}; skipping drift check", e);
                (DriftStatus::CacheUnavailable, None)
            }
        };

        let mut report = None;
        match &status {
            DriftStatus::FirstIngest => {
                info!("🆕 First time ingest for {}, no previous schema", dataset.name);
            }
            DriftStatus::Unchanged => {
                info!("✅ No schema change for {}", dataset.name);
            }
            DriftStatus::Changed(diff) => {
                info!(
                    "⚠️  Schema change detected for {} ({} changes): {} added, {} removed, {} changed type",
                    dataset.name,
                    diff.total_changes(),
                    diff.added.len(),
                    diff.removed.len(),
                    diff.changed_type.len()
                );
                if let Some(old) = &previous {
                    report = self.report(&dataset.name, diff, old, &snapshot);
                }
            }
            DriftStatus::CacheUnavailable => {}
        }

        let cache_written = match self.cache.store(&dataset.name, &snapshot) {
            Ok(path) => {
                debug!("Cached schema at {}", path.display());
                true
            }
            Err(e) => {
                warn!(kind = e.kind(), "⚠️  {}", e);
                false
            }
        };

        let descriptor = DatasetDescriptor {
            name: &dataset.name,
            source_path: &dataset.path,
            format,
            description: dataset.description.as_deref(),
        };
        let event = self
            .events
            .build(&descriptor, &observed, &snapshot.checksum(), Utc::now());

        self.emitter.emit(&event).await?;

        info!("✅ Ingested dataset {} as {}", dataset.name, event.urn());

        Ok(DatasetOutcome {
            dataset: dataset.name.clone(),
            format,
            urn: event.urn().to_string(),
            field_count: observed.fields.len(),
            status,
            report,
            cache_written,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Read the source schema on the blocking pool, bounded by the timeout
    async fn observe(&self, format: SourceFormat, path: &Path) -> IngestResult<ObservedSchema> {
        let owned = path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || read_schema(format, &owned));

        let joined = match self.processing_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| IngestError::Timeout(limit.as_secs()))?,
            None => task.await,
        };

        joined.map_err(|e| source_error(path, format!("reader task failed: {}", e)))?
    }

    fn report(
        &self,
        dataset: &str,
        diff: &SchemaDiff,
        old: &SchemaSnapshot,
        new: &SchemaSnapshot,
    ) -> Option<PathBuf> {
        let path = match self.reports.write(dataset, diff, old, new) {
            Ok(path) => path,
            Err(e) => {
                warn!(kind = e.kind(), "⚠️  {}", e);
                return None;
            }
        };

        if let Err(e) = self.reports.present(&path) {
            warn!(kind = e.kind(), "⚠️  {}", e);
        }
        Some(path)
    }
}
