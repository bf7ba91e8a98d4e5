//! FetchCycle - one poll of one branch terminal

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Branch, ContractError, DeliveryMode, GatewayConfig, IngestionSender, PunchRecord, Timestamp,
    WatermarkPolicy,
};
use device::{DeviceClient, DeviceError};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::watermark::WatermarkStore;

/// Why a branch cycle did not complete
#[derive(Debug, Error)]
pub enum CycleError {
    /// Terminal session could not be opened
    #[error("connect failed: {source}")]
    Connect {
        #[source]
        source: DeviceError,
    },

    /// Records could not be read back
    #[error("record retrieval failed: {source}")]
    Retrieve {
        #[source]
        source: DeviceError,
    },

    /// Ingestion API rejected or never received the batch
    #[error("sending {records} records failed (watermark advanced: {watermark_advanced}): {reason}")]
    Send {
        records: usize,
        #[source]
        reason: ContractError,
        watermark_advanced: bool,
    },

    /// Cycle exceeded the configured bound
    #[error("cycle timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Branch task panicked or was cancelled
    #[error("branch task aborted: {message}")]
    Aborted { message: String },
}

/// Result of a completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    /// Records the terminal returned
    pub fetched: usize,
    /// Records newer than the watermark that were delivered
    pub forwarded: usize,
    /// Branch watermark after the cycle
    pub watermark: Option<Timestamp>,
}

/// Per-branch outcome reported to the scheduler
#[derive(Debug)]
pub struct BranchOutcome {
    pub branch_id: String,
    pub result: Result<CycleSummary, CycleError>,
    pub elapsed: Duration,
}

impl BranchOutcome {
    pub(crate) fn aborted(branch_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
            result: Err(CycleError::Aborted {
                message: message.into(),
            }),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Records delivered by this cycle
    pub fn forwarded(&self) -> usize {
        self.result.as_ref().map_or(0, |summary| summary.forwarded)
    }
}

/// Watermark and delivery semantics of a cycle
#[derive(Debug, Clone, Default)]
pub struct CycleConfig {
    pub policy: WatermarkPolicy,
    pub mode: DeliveryMode,
    /// Tenant sent for every branch instead of the branch id
    pub tenant_override: Option<String>,
    /// Deadline for connect, fetch and send; disconnect gets its own bound
    pub timeout: Option<Duration>,
}

impl CycleConfig {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            policy: config.delivery.watermark_policy,
            mode: config.delivery.mode,
            tenant_override: config
                .ingestion
                .tenant_id
                .clone()
                .filter(|tenant| !tenant.trim().is_empty()),
            timeout: config.scheduler.cycle_timeout(),
        }
    }
}

/// Runs fetch cycles against a shared watermark store and sender
pub struct FetchCycle<S> {
    store: Arc<WatermarkStore>,
    sender: Arc<S>,
    config: CycleConfig,
}

impl<S> FetchCycle<S>
where
    S: IngestionSender + Sync,
{
    pub fn new(store: Arc<WatermarkStore>, sender: Arc<S>, config: CycleConfig) -> Self {
        Self {
            store,
            sender,
            config,
        }
    }

    pub fn store(&self) -> &Arc<WatermarkStore> {
        &self.store
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Poll one branch with a fresh, unconnected client
    ///
    /// Never fails: every error is captured in the returned outcome.
    #[instrument(
        name = "fetch_cycle",
        skip(self, branch, client),
        fields(branch = %branch.id, address = %branch.address)
    )]
    pub async fn run<C: DeviceClient>(&self, branch: &Branch, client: C) -> BranchOutcome {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|limit| started + limit);

        let result = self.execute(branch, client, deadline).await;

        match &result {
            Ok(summary) => {
                observability::record_records_forwarded(&branch.id, summary.forwarded);
                if let Some(watermark) = summary.watermark {
                    observability::record_watermark(&branch.id, watermark.and_utc().timestamp());
                }
            }
            Err(e) => warn!(error = %e, "Branch cycle failed"),
        }
        observability::record_cycle_outcome(&branch.id, result.is_ok());

        BranchOutcome {
            branch_id: branch.id.clone(),
            result,
            elapsed: started.elapsed(),
        }
    }

    async fn execute<C: DeviceClient>(
        &self,
        branch: &Branch,
        mut client: C,
        deadline: Option<Instant>,
    ) -> Result<CycleSummary, CycleError> {
        self.within(deadline, client.connect())
            .await?
            .map_err(|source| CycleError::Connect { source })?;

        let result = self.process(branch, &mut client, deadline).await;

        // Outcome is settled before the session closes
        self.close(&mut client).await;

        result
    }

    async fn process<C: DeviceClient>(
        &self,
        branch: &Branch,
        client: &mut C,
        deadline: Option<Instant>,
    ) -> Result<CycleSummary, CycleError> {
        let records = self
            .within(deadline, client.fetch_records())
            .await?
            .map_err(|source| CycleError::Retrieve { source })?;
        let fetched = records.len();

        let watermark = self.store.get(&branch.id);
        let fresh = newer_than(records, watermark);

        let Some(next) = next_watermark(&fresh, self.config.policy) else {
            info!(fetched, "No new punches");
            return Ok(CycleSummary {
                fetched,
                forwarded: 0,
                watermark,
            });
        };

        let tenant = self.config.tenant_override.as_deref().unwrap_or(&branch.id);
        let sent = match self.within(deadline, self.sender.send(&fresh, tenant)).await {
            Ok(sent) => sent,
            // A timed-out send is a failed send for watermark purposes
            Err(timeout) => Err(ContractError::send_failed(
                self.sender.name(),
                tenant,
                timeout.to_string(),
            )),
        };

        match sent {
            Ok(()) => {
                self.store.set(&branch.id, next);
                info!(
                    fetched,
                    records = fresh.len(),
                    watermark = %next,
                    "Forwarded new punches"
                );
                Ok(CycleSummary {
                    fetched,
                    forwarded: fresh.len(),
                    watermark: Some(next),
                })
            }
            Err(reason) => {
                let watermark_advanced = self.config.mode == DeliveryMode::AtMostOnce;
                if watermark_advanced {
                    self.store.set(&branch.id, next);
                }
                Err(CycleError::Send {
                    records: fresh.len(),
                    reason,
                    watermark_advanced,
                })
            }
        }
    }

    /// Await `step` until the cycle deadline
    async fn within<F: Future>(
        &self,
        deadline: Option<Instant>,
        step: F,
    ) -> Result<F::Output, CycleError> {
        match deadline {
            Some(at) => tokio::time::timeout_at(at, step)
                .await
                .map_err(|_| self.timed_out()),
            None => Ok(step.await),
        }
    }

    fn timed_out(&self) -> CycleError {
        CycleError::Timeout {
            after_ms: self
                .config
                .timeout
                .map_or(0, |limit| limit.as_millis() as u64),
        }
    }

    /// Best-effort disconnect, bounded by its own cycle-length limit
    ///
    /// Errors and expiry are logged only.
    async fn close<C: DeviceClient>(&self, client: &mut C) {
        let closed = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, client.disconnect()).await {
                Ok(closed) => closed,
                Err(_) => {
                    warn!(
                        after_ms = limit.as_millis() as u64,
                        "Disconnect timed out, dropping session"
                    );
                    return;
                }
            },
            None => client.disconnect().await,
        };
        if let Err(e) = closed {
            warn!(error = %e, "Disconnect failed");
        }
    }
}

/// Records strictly newer than the watermark, in device order
pub(crate) fn newer_than(
    records: Vec<PunchRecord>,
    watermark: Option<Timestamp>,
) -> Vec<PunchRecord> {
    match watermark {
        Some(mark) => records
            .into_iter()
            .filter(|record| record.record_time > mark)
            .collect(),
        None => records,
    }
}

/// Watermark to store once `batch` is delivered, `None` for an empty batch
pub(crate) fn next_watermark(
    batch: &[PunchRecord],
    policy: WatermarkPolicy,
) -> Option<Timestamp> {
    match policy {
        WatermarkPolicy::MaxTimestamp => batch.iter().map(|record| record.record_time).max(),
        WatermarkPolicy::LastRecord => batch.last().map(|record| record.record_time),
    }
}
