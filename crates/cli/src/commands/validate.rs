//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DeliveryMode, DirectorySource, GatewayConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    directory_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    static_branches: Option<usize>,
    poll_interval_secs: u64,
    max_concurrent_branches: usize,
    device_port: u16,
    ingestion: String,
    delivery_mode: String,
    watermark_policy: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match super::load_config(&args.config, &args.overrides) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(config: &GatewayConfig) -> ConfigSummary {
    let ingestion = if config.ingestion.dry_run {
        "dry run (log only)".to_string()
    } else {
        config.ingestion.url.clone()
    };

    ConfigSummary {
        version: format!("{:?}", config.version),
        directory_source: format!("{:?}", config.directory.source),
        static_branches: (config.directory.source == DirectorySource::Static)
            .then_some(config.directory.branches.len()),
        poll_interval_secs: config.scheduler.poll_interval_secs,
        max_concurrent_branches: config.scheduler.max_concurrent_branches,
        device_port: config.device.port,
        ingestion,
        delivery_mode: format!("{:?}", config.delivery.mode),
        watermark_policy: format!("{:?}", config.delivery.watermark_policy),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &GatewayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.directory.source == DirectorySource::Static && config.directory.branches.is_empty() {
        warnings.push("Static directory lists no branches - nothing will be polled".to_string());
    }

    if config.delivery.mode == DeliveryMode::AtMostOnce {
        warnings.push(
            "delivery.mode is at_most_once - batches that fail to send are never retried"
                .to_string(),
        );
    }

    if config.ingestion.tenant_id.is_some() {
        warnings.push(
            "ingestion.tenant_id is set - every branch posts as the same tenant".to_string(),
        );
    }

    if config.scheduler.cycle_timeout().is_none() {
        warnings.push(
            "scheduler.cycle_timeout_secs is 0 - a hung terminal can stall a pass".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Directory: {}", summary.directory_source);
            if let Some(count) = summary.static_branches {
                println!("  Branches: {}", count);
            }
            println!("  Poll interval: {}s", summary.poll_interval_secs);
            println!("  Max concurrent branches: {}", summary.max_concurrent_branches);
            println!("  Device port: {}", summary.device_port);
            println!("  Ingestion: {}", summary.ingestion);
            println!("  Delivery mode: {}", summary.delivery_mode);
            println!("  Watermark policy: {}", summary.watermark_policy);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
