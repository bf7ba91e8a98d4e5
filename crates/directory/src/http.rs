//! HttpDirectory - branch list served by a JSON endpoint

use std::time::Duration;

use contracts::{Branch, BranchDirectory, ContractError};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::DirectoryError;
use crate::file::BranchFile;

/// Directory queried over HTTP GET
///
/// The endpoint returns `[{ "id": .., "ip": .. }]` or `{ "branches": [..] }`.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    url: String,
    client: Client,
}

impl HttpDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BranchDirectory for HttpDirectory {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(name = "http_directory_branches", skip(self), fields(url = %self.url))]
    async fn branches(&self) -> Result<Vec<Branch>, ContractError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ContractError::directory(self.name(), format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::directory(
                self.name(),
                format!("directory responded with status {status}"),
            ));
        }

        let parsed: BranchFile = response
            .json()
            .await
            .map_err(|e| ContractError::directory(self.name(), format!("invalid body: {e}")))?;

        let branches = parsed.into_branches();
        debug!(branches = branches.len(), "Branch list fetched");
        Ok(branches)
    }
}
