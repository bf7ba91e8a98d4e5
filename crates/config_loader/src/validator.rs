//! Configuration validation
//!
//! Rules:
//! - poll interval > 0, concurrency >= 1
//! - device port and timeouts non-zero
//! - ingestion url is http(s) unless dry_run
//! - directory source has its required field
//! - static branch ids unique and non-empty

use std::collections::HashSet;

use contracts::{ContractError, DirectorySource, GatewayConfig};

/// Validate a GatewayConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &GatewayConfig) -> Result<(), ContractError> {
    validate_scheduler(config)?;
    validate_device(config)?;
    validate_ingestion(config)?;
    validate_directory(config)?;
    Ok(())
}

fn validate_scheduler(config: &GatewayConfig) -> Result<(), ContractError> {
    let scheduler = &config.scheduler;
    if scheduler.poll_interval_secs == 0 {
        return Err(ContractError::config_validation(
            "scheduler.poll_interval_secs",
            "poll_interval_secs must be > 0",
        ));
    }
    if scheduler.max_concurrent_branches == 0 {
        return Err(ContractError::config_validation(
            "scheduler.max_concurrent_branches",
            "max_concurrent_branches must be >= 1",
        ));
    }
    Ok(())
}

fn validate_device(config: &GatewayConfig) -> Result<(), ContractError> {
    let device = &config.device;
    if device.port == 0 {
        return Err(ContractError::config_validation(
            "device.port",
            "port must be non-zero",
        ));
    }
    if device.connect_timeout_ms == 0 || device.reply_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "device.connect_timeout_ms / device.reply_timeout_ms",
            "device timeouts must be > 0",
        ));
    }
    Ok(())
}

fn validate_ingestion(config: &GatewayConfig) -> Result<(), ContractError> {
    let ingestion = &config.ingestion;
    if ingestion.dry_run {
        return Ok(());
    }

    if ingestion.url.trim().is_empty() {
        return Err(ContractError::config_validation(
            "ingestion.url",
            "ingestion url is required (set it in the file or via PUNCH_URL)",
        ));
    }
    if !is_http_url(&ingestion.url) {
        return Err(ContractError::config_validation(
            "ingestion.url",
            format!("expected an http(s) url, got '{}'", ingestion.url),
        ));
    }
    if ingestion.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "ingestion.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    if let Some(tenant) = &ingestion.tenant_id {
        if tenant.trim().is_empty() {
            return Err(ContractError::config_validation(
                "ingestion.tenant_id",
                "tenant_id cannot be empty when set",
            ));
        }
    }
    Ok(())
}

fn validate_directory(config: &GatewayConfig) -> Result<(), ContractError> {
    let directory = &config.directory;
    match directory.source {
        DirectorySource::Static => {
            let mut seen = HashSet::new();
            for (idx, branch) in directory.branches.iter().enumerate() {
                if branch.id.trim().is_empty() {
                    return Err(ContractError::config_validation(
                        format!("directory.branches[{idx}].id"),
                        "branch id cannot be empty",
                    ));
                }
                if branch.address.trim().is_empty() {
                    return Err(ContractError::config_validation(
                        format!("directory.branches[id={}].address", branch.id),
                        "branch address cannot be empty",
                    ));
                }
                if !seen.insert(&branch.id) {
                    return Err(ContractError::config_validation(
                        format!("directory.branches[id={}]", branch.id),
                        "duplicate branch id",
                    ));
                }
            }
        }
        DirectorySource::File => {
            if directory.path.is_none() {
                return Err(ContractError::config_validation(
                    "directory.path",
                    "file directory requires a path",
                ));
            }
        }
        DirectorySource::Http => match &directory.url {
            Some(url) if is_http_url(url) => {}
            Some(url) => {
                return Err(ContractError::config_validation(
                    "directory.url",
                    format!("expected an http(s) url, got '{url}'"),
                ));
            }
            None => {
                return Err(ContractError::config_validation(
                    "directory.url",
                    "http directory requires a url",
                ));
            }
        },
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Branch, ConfigVersion, DeliverySettings, DeviceSettings, DirectorySettings,
        IngestionSettings, SchedulerSettings,
    };

    fn minimal_config() -> GatewayConfig {
        GatewayConfig {
            version: ConfigVersion::V1,
            scheduler: SchedulerSettings::default(),
            device: DeviceSettings::default(),
            ingestion: IngestionSettings {
                url: "http://localhost:3000/api/punches".into(),
                timeout_ms: 1000,
                ..Default::default()
            },
            delivery: DeliverySettings::default(),
            directory: DirectorySettings {
                source: DirectorySource::Static,
                branches: vec![Branch::new("B1", "10.0.0.10")],
                path: None,
                url: None,
                timeout_ms: 1000,
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_zero_interval() {
        let mut config = minimal_config();
        config.scheduler.poll_interval_secs = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("poll_interval_secs must be > 0"), "got: {err}");
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = minimal_config();
        config.scheduler.max_concurrent_branches = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_concurrent_branches"), "got: {err}");
    }

    #[test]
    fn test_missing_ingestion_url() {
        let mut config = minimal_config();
        config.ingestion.url = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("PUNCH_URL"), "got: {err}");
    }

    #[test]
    fn test_dry_run_skips_url_check() {
        let mut config = minimal_config();
        config.ingestion.url = String::new();
        config.ingestion.dry_run = true;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_non_http_ingestion_url() {
        let mut config = minimal_config();
        config.ingestion.url = "ftp://example.com".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("http(s)"), "got: {err}");
    }

    #[test]
    fn test_duplicate_branch_id() {
        let mut config = minimal_config();
        config
            .directory
            .branches
            .push(Branch::new("B1", "10.0.0.11"));
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate branch id"), "got: {err}");
    }

    #[test]
    fn test_empty_branch_address() {
        let mut config = minimal_config();
        config.directory.branches[0].address = " ".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("address cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_file_directory_requires_path() {
        let mut config = minimal_config();
        config.directory.source = DirectorySource::File;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("requires a path"), "got: {err}");
    }

    #[test]
    fn test_http_directory_requires_url() {
        let mut config = minimal_config();
        config.directory.source = DirectorySource::Http;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("requires a url"), "got: {err}");

        config.directory.url = Some("branches.json".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("http(s)"), "got: {err}");
    }
}
