//! `branches` command implementation.

use anyhow::{Context, Result};
use contracts::{Branch, BranchDirectory};
use directory::AnyDirectory;
use tracing::info;

use crate::cli::{BranchesArgs, OverrideArgs};
use crate::error::CliError;

/// Execute the `branches` command
///
/// Only the directory section is needed, so the rest of the file is not validated.
pub async fn run_branches(args: &BranchesArgs) -> Result<()> {
    let config = super::read_config(&args.config, &OverrideArgs::default())?;
    let directory = AnyDirectory::from_settings(&config.directory)
        .map_err(|e| CliError::startup("branch directory", e))?;

    info!(directory = %directory.name(), "Querying branch directory");
    let branches = directory
        .branches()
        .await
        .context("Failed to enumerate branches")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&branches).context("Failed to serialize branches")?;
        println!("{}", json);
    } else {
        print_branches(&branches, config.device.port);
    }

    Ok(())
}

fn print_branches(branches: &[Branch], port: u16) {
    println!("\nBranches ({}):", branches.len());
    for branch in branches {
        println!("  - {:<16} {}:{}", branch.id, branch.address, port);
    }
    println!();
}
