//! # Directory
//!
//! Branch directory sources.
//!
//! The fleet scheduler asks the directory for the branch list once per
//! pass, so file and HTTP sources pick up changes without a restart.
//!
//! - [`StaticDirectory`]: branches inlined in the gateway configuration
//! - [`FileDirectory`]: TOML/JSON file re-read every pass
//! - [`HttpDirectory`]: JSON endpoint queried every pass

pub mod error;
pub mod file;
pub mod http;
pub mod static_list;

pub use contracts::{Branch, BranchDirectory};
pub use error::DirectoryError;
pub use file::FileDirectory;
pub use http::HttpDirectory;
pub use static_list::StaticDirectory;

use contracts::{ContractError, DirectorySettings, DirectorySource};

/// Any configured directory source
pub enum AnyDirectory {
    Static(StaticDirectory),
    File(FileDirectory),
    Http(HttpDirectory),
}

impl AnyDirectory {
    /// Build the directory selected by configuration
    pub fn from_settings(settings: &DirectorySettings) -> Result<Self, DirectoryError> {
        match settings.source {
            DirectorySource::Static => Ok(Self::Static(StaticDirectory::new(
                settings.branches.clone(),
            ))),
            DirectorySource::File => {
                let path = settings
                    .path
                    .clone()
                    .ok_or_else(|| DirectoryError::missing_setting("directory.path"))?;
                Ok(Self::File(FileDirectory::new(path)))
            }
            DirectorySource::Http => {
                let url = settings
                    .url
                    .clone()
                    .ok_or_else(|| DirectoryError::missing_setting("directory.url"))?;
                Ok(Self::Http(HttpDirectory::new(url, settings.timeout())?))
            }
        }
    }
}

impl BranchDirectory for AnyDirectory {
    fn name(&self) -> &str {
        match self {
            Self::Static(d) => d.name(),
            Self::File(d) => d.name(),
            Self::Http(d) => d.name(),
        }
    }

    async fn branches(&self) -> Result<Vec<Branch>, ContractError> {
        match self {
            Self::Static(d) => d.branches().await,
            Self::File(d) => d.branches().await,
            Self::Http(d) => d.branches().await,
        }
    }
}
