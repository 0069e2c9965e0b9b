//! Result types for a pipeline run

use crate::error::IngestError;
use crate::models::SourceFormat;
use crate::snapshot::DriftStatus;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened to one dataset that made it all the way to the catalog
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub dataset: String,
    pub format: SourceFormat,
    pub urn: String,
    pub field_count: usize,
    pub status: DriftStatus,
    pub report: Option<PathBuf>,
    pub cache_written: bool,
    pub duration_ms: u64,
}

/// A dataset that was abandoned, with its error code
#[derive(Debug, Clone)]
pub struct DatasetFailure {
    pub dataset: String,
    pub kind: &'static str,
    pub message: String,
}

/// Aggregate of one invocation
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub succeeded: Vec<DatasetOutcome>,
    pub failed: Vec<DatasetFailure>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, dataset: &str, error: &IngestError) {
        self.failed.push(DatasetFailure {
            dataset: dataset.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn changed_count(&self) -> usize {
        self.succeeded
            .iter()
            .filter(|o| matches!(o.status, DriftStatus::Changed(_)))
            .count()
    }

    /// Emit the closing summary line
    pub fn log(&self) {
        let elapsed = Utc::now() - self.started_at;
        let total = self.succeeded.len() + self.failed.len();

        for outcome in &self.succeeded {
            debug!(
                "{} [{}] {}: {} fields, {}, cache {}, report {}, {}ms",
                outcome.dataset,
                outcome.format,
                outcome.urn,
                outcome.field_count,
                outcome.status.label(),
                if outcome.cache_written { "written" } else { "stale" },
                outcome
                    .report
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string()),
                outcome.duration_ms
            );
        }
        for failure in &self.failed {
            debug!("{} [{}]: {}", failure.dataset, failure.kind, failure.message);
        }

        if self.has_failures() {
            let names: Vec<String> = self
                .failed
                .iter()
                .map(|f| format!("{} ({})", f.dataset, f.kind))
                .collect();
            warn!(
                "🏁 Run {} finished in {}ms: {}/{} datasets ingested, {} with schema changes, failed: {}",
                self.run_id,
                elapsed.num_milliseconds(),
                self.succeeded.len(),
                total,
                self.changed_count(),
                names.join(", ")
            );
        } else {
            info!(
                "🏁 Run {} finished in {}ms: {}/{} datasets ingested, {} with schema changes",
                self.run_id,
                elapsed.num_milliseconds(),
                self.succeeded.len(),
                total,
                self.changed_count()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SchemaDiff;
    use std::collections::BTreeSet;

    fn outcome(status: DriftStatus) -> DatasetOutcome {
        DatasetOutcome {
            dataset: "d".to_string(),
            format: SourceFormat::Csv,
            urn: "urn:li:dataset:(urn:li:dataPlatform:csv,d,DEV)".to_string(),
            field_count: 1,
            status,
            report: None,
            cache_written: true,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new(Uuid::new_v4());
        assert!(!summary.has_failures());

        summary.succeeded.push(outcome(DriftStatus::FirstIngest));
        summary.succeeded.push(outcome(DriftStatus::Changed(SchemaDiff {
            added: BTreeSet::from(["x".to_string()]),
            ..Default::default()
        })));
        summary.record_failure("broken", &IngestError::Timeout(5));

        assert_eq!(summary.changed_count(), 1);
        assert!(summary.has_failures());
        assert_eq!(summary.failed[0].kind, "TIMEOUT");
        assert_eq!(summary.failed[0].dataset, "broken");
    }
}
