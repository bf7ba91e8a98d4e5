//! FileDirectory - branch list file re-read every pass
//!
//! Accepted shapes:
//! - TOML: `branches = [{ id = "B1", address = "10.0.0.10" }]`
//! - JSON: `{ "branches": [...] }` or a bare `[...]`

use std::path::{Path, PathBuf};

use contracts::{Branch, BranchDirectory, ContractError};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum BranchFile {
    Wrapped { branches: Vec<Branch> },
    Bare(Vec<Branch>),
}

impl BranchFile {
    pub(crate) fn into_branches(self) -> Vec<Branch> {
        match self {
            Self::Wrapped { branches } | Self::Bare(branches) => branches,
        }
    }
}

/// Directory backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }

    fn parse(&self, content: &str) -> Result<Vec<Branch>, ContractError> {
        let parsed: BranchFile = if self.is_json() {
            serde_json::from_str(content).map_err(|e| {
                ContractError::directory(self.name(), format!("JSON parse error: {e}"))
            })?
        } else {
            toml::from_str(content).map_err(|e| {
                ContractError::directory(self.name(), format!("TOML parse error: {e}"))
            })?
        };
        Ok(parsed.into_branches())
    }
}

impl BranchDirectory for FileDirectory {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(
        name = "file_directory_branches",
        skip(self),
        fields(path = %self.path.display())
    )]
    async fn branches(&self) -> Result<Vec<Branch>, ContractError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ContractError::directory(
                self.name(),
                format!("failed to read {}: {e}", self.path.display()),
            )
        })?;

        let branches = self.parse(&content)?;
        debug!(branches = branches.len(), "Branch file loaded");
        Ok(branches)
    }
}
