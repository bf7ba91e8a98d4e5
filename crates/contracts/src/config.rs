//! GatewayConfig - Config Loader output
//!
//! Describes the full gateway configuration: scheduling cadence, device
//! protocol settings, ingestion endpoint, delivery semantics and the
//! branch directory source.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::Branch;

/// Default fixed device port of the attendance terminals
pub const DEFAULT_DEVICE_PORT: u16 = 4370;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Fleet pass scheduling
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    /// Terminal protocol settings
    #[serde(default)]
    pub device: DeviceSettings,

    /// Downstream ingestion endpoint
    pub ingestion: IngestionSettings,

    /// Watermark and delivery semantics
    #[serde(default)]
    pub delivery: DeliverySettings,

    /// Where the branch list comes from
    pub directory: DirectorySettings,
}

/// Fleet pass scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Seconds between fleet pass starts
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Branch cycles allowed in flight at once (1 = sequential)
    #[serde(default = "default_max_concurrent_branches")]
    pub max_concurrent_branches: usize,

    /// Upper bound for one branch cycle in seconds (0 = no bound)
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,
}

impl SchedulerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        (self.cycle_timeout_secs > 0).then(|| Duration::from_secs(self.cycle_timeout_secs))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_concurrent_branches: default_max_concurrent_branches(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_concurrent_branches() -> usize {
    4
}

fn default_cycle_timeout_secs() -> u64 {
    30
}

/// Terminal protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// TCP port of every terminal
    #[serde(default = "default_device_port")]
    pub port: u16,

    /// Socket connect + handshake timeout (ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for each device reply (ms)
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl DeviceSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: default_device_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

fn default_device_port() -> u16 {
    DEFAULT_DEVICE_PORT
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_reply_timeout_ms() -> u64 {
    5200
}

/// Downstream ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSettings {
    /// POST target; may be left empty in the file and supplied via `PUNCH_URL`
    #[serde(default)]
    pub url: String,

    /// Tenant sent with every batch; defaults to the branch id when unset
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Optional `X-API-Key` header value
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout (ms)
    #[serde(default = "default_ingestion_timeout_ms")]
    pub timeout_ms: u64,

    /// Log batches instead of posting them
    #[serde(default)]
    pub dry_run: bool,
}

impl IngestionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            tenant_id: None,
            api_key: None,
            timeout_ms: default_ingestion_timeout_ms(),
            dry_run: false,
        }
    }
}

fn default_ingestion_timeout_ms() -> u64 {
    10_000
}

/// Watermark and delivery semantics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// How the new watermark is derived from a forwarded batch
    #[serde(default)]
    pub watermark_policy: WatermarkPolicy,

    /// Whether a failed send still advances the watermark
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// How the new watermark is derived from a forwarded batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPolicy {
    /// Greatest record time in the batch, tolerates unordered devices
    #[default]
    MaxTimestamp,
    /// Record time of the last record in device order
    LastRecord,
}

/// Whether a failed send still advances the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Advance only after a successful send; failed batches are re-sent next pass
    #[default]
    AtLeastOnce,
    /// Advance regardless of the send outcome; failed batches are never retried
    AtMostOnce,
}

/// Where the branch list comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// Directory kind
    pub source: DirectorySource,

    /// Inline branches (`static`)
    #[serde(default)]
    pub branches: Vec<Branch>,

    /// Branch file re-read every pass (`file`)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// JSON endpoint returning the branch list (`http`)
    #[serde(default)]
    pub url: Option<String>,

    /// HTTP directory request timeout (ms)
    #[serde(default = "default_directory_timeout_ms")]
    pub timeout_ms: u64,
}

impl DirectorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_directory_timeout_ms() -> u64 {
    10_000
}

/// Directory kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySource {
    Static,
    File,
    Http,
}
