//! BranchDirectory trait - branch enumeration interface

use crate::{Branch, ContractError};

/// Source of the branch list, consulted once per fleet pass
#[trait_variant::make(BranchDirectory: Send)]
pub trait LocalBranchDirectory {
    /// Directory name (used for logging)
    fn name(&self) -> &str;

    /// Enumerate the branches to poll in this pass
    ///
    /// # Errors
    /// Returns `ContractError::Directory` when the list cannot be obtained
    async fn branches(&self) -> Result<Vec<Branch>, ContractError>;
}
