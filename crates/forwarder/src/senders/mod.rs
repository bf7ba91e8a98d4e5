//! Sender implementations

mod http;
mod log;

pub use http::{HttpSender, HttpSenderConfig, PunchBatch};
pub use log::LogSender;

use contracts::{ContractError, IngestionSender, PunchRecord};

/// Any configured sender
pub enum AnySender {
    Http(HttpSender),
    Log(LogSender),
}

impl IngestionSender for AnySender {
    fn name(&self) -> &str {
        match self {
            Self::Http(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError> {
        match self {
            Self::Http(s) => s.send(records, tenant_id).await,
            Self::Log(s) => s.send(records, tenant_id).await,
        }
    }
}
