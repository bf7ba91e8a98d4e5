//! LogSender - logs batch summary via tracing

use contracts::{ContractError, IngestionSender, PunchRecord};
use tracing::{info, instrument};

/// Sender that only logs batches, for dry runs
pub struct LogSender {
    name: String,
}

impl LogSender {
    /// Create a new LogSender with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl IngestionSender for LogSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sender_send",
        skip(self, records),
        fields(sender = %self.name, tenant = %tenant_id, records = records.len())
    )]
    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError> {
        let first = records.first().map(|r| r.record_time);
        let last = records.last().map(|r| r.record_time);
        info!(
            sender = %self.name,
            tenant = %tenant_id,
            records = records.len(),
            first = ?first,
            last = ?last,
            "Punch batch (dry run)"
        );
        Ok(())
    }
}
