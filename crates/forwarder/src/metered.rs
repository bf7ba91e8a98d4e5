//! MeteredSender - counts delivered and failed batches around any sender

use std::sync::Arc;

use contracts::{ContractError, IngestionSender, IngestionSettings, PunchRecord};
use tracing::{info, instrument, warn};

use crate::error::ForwarderError;
use crate::metrics::SenderMetrics;
use crate::senders::{AnySender, HttpSender, LogSender};

/// Wraps a sender and records every outcome in [`SenderMetrics`]
pub struct MeteredSender<S> {
    inner: S,
    metrics: Arc<SenderMetrics>,
}

impl<S: IngestionSender> MeteredSender<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            metrics: Arc::new(SenderMetrics::new()),
        }
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<SenderMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: IngestionSender + Sync> IngestionSender for MeteredSender<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError> {
        match self.inner.send(records, tenant_id).await {
            Ok(()) => {
                self.metrics.record_success(records.len());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(sender = %self.inner.name(), tenant = %tenant_id, error = %e, "Send failed");
                Err(e)
            }
        }
    }
}

/// Build the configured sender
///
/// `dry_run` selects the log sender, otherwise batches go to the ingestion URL.
#[instrument(
    name = "forwarder_create_sender",
    skip(settings),
    fields(dry_run = settings.dry_run)
)]
pub fn create_sender(
    settings: &IngestionSettings,
) -> Result<MeteredSender<AnySender>, ForwarderError> {
    let sender = if settings.dry_run {
        info!("Dry run: batches will be logged, not posted");
        AnySender::Log(LogSender::new("dry_run"))
    } else {
        let http = HttpSender::from_settings("ingestion", settings)?;
        info!(url = %http.url(), "Posting batches to ingestion API");
        AnySender::Http(http)
    };
    Ok(MeteredSender::new(sender))
}
