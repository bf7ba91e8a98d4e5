//! Command implementations.

mod branches;
mod run;
mod validate;

pub use branches::run_branches;
pub use run::run_gateway;
pub use validate::run_validate;

use std::path::Path;

use contracts::GatewayConfig;
use tracing::info;

use crate::cli::OverrideArgs;
use crate::error::CliError;

/// Read a configuration file and layer CLI/env overrides on top, without validating
fn read_config(path: &Path, overrides: &OverrideArgs) -> Result<GatewayConfig, CliError> {
    if !path.exists() {
        return Err(CliError::config_not_found(path));
    }

    let mut config = config_loader::ConfigLoader::read_from_path(path)
        .map_err(|e| CliError::invalid_config(path, e))?;
    apply_overrides(&mut config, overrides);
    Ok(config)
}

/// Read, override and validate a configuration file
fn load_config(path: &Path, overrides: &OverrideArgs) -> Result<GatewayConfig, CliError> {
    let config = read_config(path, overrides)?;
    config_loader::ConfigLoader::validate(&config)
        .map_err(|e| CliError::invalid_config(path, e))?;
    Ok(config)
}

fn apply_overrides(config: &mut GatewayConfig, overrides: &OverrideArgs) {
    if let Some(url) = &overrides.punch_url {
        info!(url = %url, "Overriding ingestion url");
        config.ingestion.url = url.clone();
    }
    if let Some(tenant) = &overrides.tenant_id {
        info!(tenant = %tenant, "Overriding tenant id for all branches");
        config.ingestion.tenant_id = Some(tenant.clone());
    }
    if let Some(key) = &overrides.api_key {
        config.ingestion.api_key = Some(key.clone());
    }
    if let Some(secs) = overrides.interval {
        info!(interval_secs = secs, "Overriding poll interval");
        config.scheduler.poll_interval_secs = secs;
    }
    if overrides.dry_run {
        config.ingestion.dry_run = true;
    }
}
