//! StaticDirectory - branches fixed in configuration

use contracts::{Branch, BranchDirectory, ContractError};

/// Directory backed by a fixed branch list
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    branches: Vec<Branch>,
}

impl StaticDirectory {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self { branches }
    }
}

impl BranchDirectory for StaticDirectory {
    fn name(&self) -> &str {
        "static"
    }

    async fn branches(&self) -> Result<Vec<Branch>, ContractError> {
        Ok(self.branches.clone())
    }
}
