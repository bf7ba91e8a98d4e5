//! # Device
//!
//! Attendance terminal access module.
//!
//! Responsibilities:
//! - Define the `DeviceClient` session abstraction used by fetch cycles
//! - Speak the terminals' TCP attendance protocol (`ZkClient`)
//! - Provide a scriptable mock terminal for tests and dry runs
//!
//! One client is created per fetch cycle; there is no pooling or retry here.

pub mod client;
pub mod error;
pub mod mock_client;
pub mod zk;

pub use client::{DeviceClient, DeviceConnector};
pub use contracts::{Branch, DeviceSettings, PunchRecord};
pub use error::{DeviceError, Result};
pub use mock_client::{MockConnector, MockDevice, MockDeviceClient};
pub use zk::{ZkClient, ZkConnector};
