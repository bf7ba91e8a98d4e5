//! Pass and run level reporting

use std::fmt;
use std::time::Duration;

use crate::cycle::BranchOutcome;

/// Everything one fleet pass produced
#[derive(Debug)]
pub struct PassReport {
    /// 1-based pass number
    pub pass: u64,
    /// One outcome per distinct branch, in directory order
    pub outcomes: Vec<BranchOutcome>,
    pub elapsed: Duration,
}

impl PassReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn records_forwarded(&self) -> usize {
        self.outcomes.iter().map(BranchOutcome::forwarded).sum()
    }

    /// Outcome of a branch in this pass
    pub fn outcome(&self, branch_id: &str) -> Option<&BranchOutcome> {
        self.outcomes.iter().find(|o| o.branch_id == branch_id)
    }
}

/// Totals over a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Passes that enumerated the directory and ran their cycles
    pub passes: u64,
    /// Passes abandoned because the directory could not be read
    pub directory_failures: u64,
    pub branch_cycles: u64,
    pub branch_failures: u64,
    pub records_forwarded: u64,
    pub duration: Duration,
}

impl SchedulerStats {
    pub fn record_pass(&mut self, report: &PassReport) {
        self.passes += 1;
        self.branch_cycles += report.outcomes.len() as u64;
        self.branch_failures += report.failed() as u64;
        self.records_forwarded += report.records_forwarded() as u64;
    }

    pub fn record_directory_failure(&mut self) {
        self.directory_failures += 1;
    }

    /// Share of branch cycles that failed, in percent
    pub fn failure_rate(&self) -> f64 {
        if self.branch_cycles > 0 {
            (self.branch_failures as f64 / self.branch_cycles as f64) * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Passes: {}", self.passes)?;
        writeln!(f, "Directory failures: {}", self.directory_failures)?;
        writeln!(
            f,
            "Branch cycles: {} ({} failed, {:.2}%)",
            self.branch_cycles,
            self.branch_failures,
            self.failure_rate()
        )?;
        writeln!(f, "Records forwarded: {}", self.records_forwarded)?;
        write!(f, "Duration: {:.2}s", self.duration.as_secs_f64())
    }
}
