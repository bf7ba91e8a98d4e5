//! # Poller
//!
//! 轮询核心：按 branch 拉取考勤终端记录，基于 watermark 去重后转发。
//!
//! 负责：
//! - `WatermarkStore`：每个 branch 已转发的最新打卡时间
//! - `FetchCycle`：单个 branch 的 connect → fetch → 过滤 → send → disconnect
//! - `FleetScheduler`：定时 fleet pass，branch 之间故障隔离
//!
//! ## 使用示例
//!
//! ```ignore
//! use poller::{CycleConfig, FetchCycle, FleetScheduler, SchedulerConfig, WatermarkStore};
//!
//! let store = Arc::new(WatermarkStore::new());
//! let cycle = FetchCycle::new(store, Arc::new(sender), CycleConfig::from_config(&config));
//! let scheduler_config = SchedulerConfig::from_config(&config);
//! let mut scheduler = FleetScheduler::new(directory, connector, cycle, scheduler_config);
//!
//! let stats = scheduler.run(shutdown_signal(), None).await;
//! ```

mod cycle;
mod report;
mod scheduler;
mod watermark;

#[cfg(test)]
mod testing;

// Re-exports
pub use contracts::{DeliveryMode, WatermarkPolicy};
pub use cycle::{BranchOutcome, CycleConfig, CycleError, CycleSummary, FetchCycle};
pub use report::{PassReport, SchedulerStats};
pub use scheduler::{FleetScheduler, SchedulerConfig};
pub use watermark::WatermarkStore;
