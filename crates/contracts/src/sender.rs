//! IngestionSender trait - downstream output interface
//!
//! Defines the abstract interface for forwarding punch batches.

use crate::{ContractError, PunchRecord};

/// Punch batch output trait
///
/// All sender implementations must implement this trait.
#[trait_variant::make(IngestionSender: Send)]
pub trait LocalIngestionSender {
    /// Sender name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Forward one batch of punches for a tenant
    ///
    /// Performs a single delivery attempt, no retry.
    ///
    /// # Errors
    /// Returns `ContractError::SendFailed` on transport failure or a non-success response
    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError>;
}
