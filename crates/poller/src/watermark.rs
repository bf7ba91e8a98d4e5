//! Per-branch watermark store

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use contracts::Timestamp;

/// Latest forwarded punch time per branch
///
/// In-memory only; every branch starts without a watermark after a restart.
/// Entries are never removed, a branch that leaves the directory keeps its
/// watermark in case it comes back.
#[derive(Debug, Default)]
pub struct WatermarkStore {
    marks: RwLock<HashMap<String, Timestamp>>,
}

impl WatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watermark of a branch, `None` until its first successful advance
    pub fn get(&self, branch_id: &str) -> Option<Timestamp> {
        self.marks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(branch_id)
            .copied()
    }

    /// Overwrite a branch watermark
    ///
    /// Callers only pass values greater than the current one.
    pub fn set(&self, branch_id: impl Into<String>, watermark: Timestamp) {
        self.marks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(branch_id.into(), watermark);
    }

    pub fn len(&self) -> usize {
        self.marks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every watermark, for diagnostics
    pub fn snapshot(&self) -> HashMap<String, Timestamp> {
        self.marks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
