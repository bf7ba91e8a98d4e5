//! # Forwarder
//!
//! 下游数据转发模块。
//!
//! 负责：
//! - 将一批新打卡记录 POST 到 ingestion API
//! - 单次调用，不重试；非 2xx 视为失败
//! - 统计发送成功/失败次数

pub mod error;
pub mod metered;
pub mod metrics;
pub mod senders;

pub use contracts::{IngestionSender, PunchRecord};
pub use error::ForwarderError;
pub use metered::{create_sender, MeteredSender};
pub use metrics::{MetricsSnapshot, SenderMetrics};
pub use senders::{AnySender, HttpSender, LogSender, PunchBatch};
