//! `run` command implementation.

use std::sync::Arc;

use anyhow::Result;
use contracts::GatewayConfig;
use device::ZkConnector;
use directory::AnyDirectory;
use forwarder::MetricsSnapshot;
use poller::{CycleConfig, FetchCycle, FleetScheduler, SchedulerConfig, SchedulerStats};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_gateway(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let config = super::load_config(&args.config, &args.overrides)?;
    log_config(&config);

    if let Some(port) = args.metrics_port() {
        observability::init_metrics_only(port)?;
    }

    let directory = AnyDirectory::from_settings(&config.directory)
        .map_err(|e| CliError::startup("branch directory", e))?;
    let sender = forwarder::create_sender(&config.ingestion)
        .map_err(|e| CliError::startup("ingestion sender", e))?;
    let sender_metrics = sender.metrics();
    let connector = ZkConnector::new(config.device.clone());

    let cycle = FetchCycle::new(
        Arc::new(poller::WatermarkStore::new()),
        Arc::new(sender),
        CycleConfig::from_config(&config),
    );
    let mut scheduler = FleetScheduler::new(
        directory,
        connector,
        cycle,
        SchedulerConfig::from_config(&config),
    );

    info!("Starting scheduler...");
    let stats = scheduler.run(shutdown_signal(), args.pass_limit()).await;

    print_summary(&stats, &sender_metrics.snapshot(), scheduler.watermarks());
    info!("Punch Gateway finished");
    Ok(())
}

fn log_config(config: &GatewayConfig) {
    info!(
        directory = ?config.directory.source,
        interval_secs = config.scheduler.poll_interval_secs,
        max_concurrent = config.scheduler.max_concurrent_branches,
        device_port = config.device.port,
        dry_run = config.ingestion.dry_run,
        mode = ?config.delivery.mode,
        policy = ?config.delivery.watermark_policy,
        "Configuration loaded"
    );
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_summary(
    stats: &SchedulerStats,
    sender: &MetricsSnapshot,
    watermarks: &poller::WatermarkStore,
) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Punch Gateway Summary                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Scheduler");
    println!("   ├─ Duration: {:.2}s", stats.duration.as_secs_f64());
    println!("   ├─ Passes: {}", stats.passes);
    println!("   ├─ Directory failures: {}", stats.directory_failures);
    println!(
        "   ├─ Branch cycles: {} ({} failed, {:.2}%)",
        stats.branch_cycles,
        stats.branch_failures,
        stats.failure_rate()
    );
    println!("   └─ Records forwarded: {}", stats.records_forwarded);

    println!("\n📤 Ingestion");
    println!("   ├─ Batches sent: {}", sender.batch_count);
    println!("   ├─ Batches failed: {}", sender.failure_count);
    println!("   └─ Records sent: {}", sender.record_count);

    let mut marks: Vec<_> = watermarks.snapshot().into_iter().collect();
    if !marks.is_empty() {
        marks.sort();
        println!("\n🕒 Watermarks");
        for (branch, mark) in &marks {
            println!("   ├─ {branch}: {mark}");
        }
    }

    println!();
}
