//! Test doubles shared by the poller unit tests

use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use contracts::{Branch, BranchDirectory, ContractError, IngestionSender, PunchRecord, Timestamp};

/// Seconds after 2024-05-01 00:00:00
pub fn ts(seconds: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(i64::from(seconds))
}

pub fn punch(user: &str, seconds: u32) -> PunchRecord {
    PunchRecord::new(user, ts(seconds))
}

#[derive(Debug, Clone)]
pub struct SentBatch {
    pub tenant_id: String,
    pub records: Vec<PunchRecord>,
}

/// Sender that keeps every delivered batch in memory
#[derive(Debug, Default)]
pub struct RecordingSender {
    batches: Mutex<Vec<SentBatch>>,
    fail: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Stall every send before it is recorded
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn batches(&self) -> Vec<SentBatch> {
        self.batches.lock().unwrap().clone()
    }
}

impl IngestionSender for RecordingSender {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock().unwrap() {
            return Err(ContractError::send_failed("recording", tenant_id, "status 503"));
        }
        self.batches.lock().unwrap().push(SentBatch {
            tenant_id: tenant_id.to_string(),
            records: records.to_vec(),
        });
        Ok(())
    }
}

/// Directory returning a fixed branch list, optionally failing first
#[derive(Debug, Default)]
pub struct ScriptedDirectory {
    branches: Vec<Branch>,
    failures_left: Mutex<usize>,
}

impl ScriptedDirectory {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self {
            branches,
            failures_left: Mutex::new(0),
        }
    }

    /// Fail the next `count` enumerations
    pub fn fail_next(&self, count: usize) {
        *self.failures_left.lock().unwrap() = count;
    }
}

impl BranchDirectory for ScriptedDirectory {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn branches(&self) -> Result<Vec<Branch>, ContractError> {
        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(ContractError::directory("scripted", "connection refused"));
        }
        Ok(self.branches.clone())
    }
}
