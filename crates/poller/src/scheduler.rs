//! FleetScheduler - periodic fleet passes over the branch directory

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Branch, BranchDirectory, ContractError, GatewayConfig, IngestionSender};
use device::DeviceConnector;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use crate::cycle::{BranchOutcome, FetchCycle};
use crate::report::{PassReport, SchedulerStats};
use crate::watermark::WatermarkStore;

/// Scheduler cadence and fan-out
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between pass starts
    pub poll_interval: Duration,
    /// Branch cycles in flight at once (1 = sequential)
    pub max_concurrent_branches: usize,
}

impl SchedulerConfig {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            poll_interval: config.scheduler.poll_interval(),
            max_concurrent_branches: config.scheduler.max_concurrent_branches,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_concurrent_branches: 4,
        }
    }
}

/// Drives fetch cycles for every branch the directory lists
pub struct FleetScheduler<D, C, S> {
    directory: D,
    connector: Arc<C>,
    cycle: Arc<FetchCycle<S>>,
    config: SchedulerConfig,
    passes: u64,
}

impl<D, C, S> FleetScheduler<D, C, S>
where
    D: BranchDirectory,
    C: DeviceConnector + 'static,
    S: IngestionSender + Sync + 'static,
{
    pub fn new(directory: D, connector: C, cycle: FetchCycle<S>, config: SchedulerConfig) -> Self {
        Self {
            directory,
            connector: Arc::new(connector),
            cycle: Arc::new(cycle),
            config,
            passes: 0,
        }
    }

    pub fn watermarks(&self) -> &Arc<WatermarkStore> {
        self.cycle.store()
    }

    /// Run one fleet pass
    ///
    /// Fails only when the directory cannot be enumerated; branch failures
    /// are reported in the returned outcomes.
    #[instrument(name = "fleet_pass", skip(self), fields(pass = self.passes + 1))]
    pub async fn run_once(&mut self) -> Result<PassReport, ContractError> {
        self.passes += 1;
        let pass = self.passes;
        let started = Instant::now();

        let branches = match self.directory.branches().await {
            Ok(branches) => unique_branches(branches),
            Err(e) => {
                observability::record_directory_failure();
                return Err(e);
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_branches.max(1)));
        let mut tasks = JoinSet::new();
        let mut task_branches = HashMap::with_capacity(branches.len());

        for (index, branch) in branches.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| ContractError::Other(format!("failed to acquire semaphore: {e}")))?;
            let connector = Arc::clone(&self.connector);
            let cycle = Arc::clone(&self.cycle);
            let branch_id = branch.id.clone();

            let handle = tasks.spawn(async move {
                let _permit = permit;
                let client = connector.client_for(&branch);
                (index, cycle.run(&branch, client).await)
            });
            task_branches.insert(handle.id(), (index, branch_id));
        }

        let mut outcomes = Vec::with_capacity(task_branches.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(indexed) => outcomes.push(indexed),
                Err(e) => {
                    let (index, branch_id) = task_branches.remove(&e.id()).unwrap_or_default();
                    error!(branch = %branch_id, error = %e, "Branch task aborted");
                    observability::record_cycle_outcome(&branch_id, false);
                    outcomes.push((index, BranchOutcome::aborted(branch_id, e.to_string())));
                }
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let report = PassReport {
            pass,
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
            elapsed: started.elapsed(),
        };

        observability::record_pass(report.elapsed.as_secs_f64() * 1000.0);
        info!(
            branches = report.outcomes.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            records = report.records_forwarded(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Fleet pass complete"
        );

        Ok(report)
    }

    /// Run passes on a fixed interval until `shutdown` resolves or
    /// `max_passes` passes have been attempted
    ///
    /// Passes never overlap: a tick missed by a long pass is delayed. A pass
    /// still in flight when `shutdown` fires is abandoned and its branch
    /// tasks are aborted.
    #[instrument(name = "scheduler_run", skip(self, shutdown))]
    pub async fn run<F>(&mut self, shutdown: F, max_passes: Option<u64>) -> SchedulerStats
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut stats = SchedulerStats::default();
        let mut attempts: u64 = 0;

        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = period.as_millis() as u64,
            max_concurrent = self.config.max_concurrent_branches,
            max_passes = ?max_passes,
            "Scheduler started"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            attempts += 1;
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Shutdown signal received, abandoning in-flight pass");
                    break;
                }
                result = self.run_once() => match result {
                    Ok(report) => stats.record_pass(&report),
                    Err(e) => {
                        stats.record_directory_failure();
                        warn!(error = %e, "Branch directory unavailable, retrying next tick");
                    }
                },
            }

            if max_passes.is_some_and(|max| attempts >= max) {
                info!(passes = attempts, "Pass limit reached");
                break;
            }
        }

        stats.duration = started.elapsed();
        info!(
            passes = stats.passes,
            directory_failures = stats.directory_failures,
            records = stats.records_forwarded,
            "Scheduler stopped"
        );
        stats
    }
}

/// Drop repeated branch ids, keeping the first entry
fn unique_branches(branches: Vec<Branch>) -> Vec<Branch> {
    let mut seen = HashSet::with_capacity(branches.len());
    branches
        .into_iter()
        .filter(|branch| {
            let first = seen.insert(branch.id.clone());
            if !first {
                warn!(
                    branch = %branch.id,
                    address = %branch.address,
                    "Duplicate branch id ignored"
                );
            }
            first
        })
        .collect()
}
