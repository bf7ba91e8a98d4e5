//! # Contracts
//!
//! Frozen interface contracts shared by every gateway crate: branch and
//! punch data structures, gateway configuration, and the traits for the
//! branch directory and the downstream ingestion endpoint.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Punch timestamps are the terminal's local wall clock (`NaiveDateTime`)
//! - Watermarks compare those timestamps directly, no timezone conversion

mod config;
mod directory;
mod error;
mod punch;
mod sender;

pub use config::*;
pub use directory::{BranchDirectory, LocalBranchDirectory};
pub use error::*;
pub use punch::*;
pub use sender::{IngestionSender, LocalIngestionSender};
