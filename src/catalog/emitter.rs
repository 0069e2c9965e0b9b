//! Catalog emitters
//!
//! Delivers change events to the catalog service. The REST emitter makes a
//! single attempt per event; retry policy belongs to whatever wraps the run.

use crate::catalog::event::MetadataChangeEvent;
use crate::error::{IngestError, IngestResult};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

const RESTLI_PROTOCOL_HEADER: &str = "X-RestLi-Protocol-Version";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

/// Anything that can deliver a change event
#[allow(async_fn_in_trait)]
pub trait MetadataEmitter {
    async fn emit(&self, event: &MetadataChangeEvent) -> IngestResult<()>;
}

/// Emitter talking to the catalog's REST ingestion endpoint
pub struct RestEmitter {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl RestEmitter {
    pub fn new(service_url: &str, token: Option<String>, timeout: Duration) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Emission(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/entities?action=ingest", service_url.trim_end_matches('/')),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MetadataEmitter for RestEmitter {
    async fn emit(&self, event: &MetadataChangeEvent) -> IngestResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(RESTLI_PROTOCOL_HEADER, RESTLI_PROTOCOL_VERSION)
            .json(&event.ingest_body());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::Emission(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(500).collect();
            return Err(IngestError::Emission(format!(
                "catalog rejected {} with HTTP {}: {}",
                event.urn(),
                status,
                body
            )));
        }

        debug!("Catalog accepted {} ({})", event.urn(), status);
        Ok(())
    }
}

/// Emitter that only logs the event it would have sent
#[derive(Default)]
pub struct DryRunEmitter;

impl MetadataEmitter for DryRunEmitter {
    async fn emit(&self, event: &MetadataChangeEvent) -> IngestResult<()> {
        let body = serde_json::to_string_pretty(&event.ingest_body())
            .map_err(|e| IngestError::Emission(e.to_string()))?;
        info!("🧪 Dry run, not emitting {}:\n{}", event.urn(), body);
        Ok(())
    }
}

/// Emitter selected at start-up
pub enum Emitter {
    Rest(RestEmitter),
    DryRun(DryRunEmitter),
}

impl MetadataEmitter for Emitter {
    async fn emit(&self, event: &MetadataChangeEvent) -> IngestResult<()> {
        match self {
            Emitter::Rest(rest) => rest.emit(event).await,
            Emitter::DryRun(dry) => dry.emit(event).await,
        }
    }
}
