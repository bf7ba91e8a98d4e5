//! Device client abstraction
//!
//! Defines traits for talking to an attendance terminal, supporting the real
//! protocol client and mock testing.

use std::future::Future;

use contracts::{Branch, PunchRecord};

use crate::error::Result;

/// One session with one terminal
///
/// A client is used for exactly one fetch cycle: connect, fetch, disconnect.
pub trait DeviceClient: Send {
    /// Open the session
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve every attendance record currently stored on the terminal
    ///
    /// Records are returned in device order.
    fn fetch_records(&mut self) -> impl Future<Output = Result<Vec<PunchRecord>>> + Send;

    /// Close the session
    ///
    /// Best-effort: callers log failures and carry on.
    /// Idempotent: returns Ok if the session is already closed.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Creates a fresh `DeviceClient` for a branch
pub trait DeviceConnector: Send + Sync {
    type Client: DeviceClient + 'static;

    /// Build an unconnected client targeting the branch's terminal
    fn client_for(&self, branch: &Branch) -> Self::Client;
}
