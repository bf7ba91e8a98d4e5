//! Branch and punch record definitions
//!
//! A branch is one attendance terminal plus its tenant identity. A punch
//! record is one event read back from that terminal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Punch timestamp as reported by the terminal (device local time)
pub type Timestamp = NaiveDateTime;

/// One attendance terminal known to the branch directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch {
    /// Branch identifier, also used as the tenant identifier
    pub id: String,

    /// Terminal host name or IP address
    #[serde(alias = "ip")]
    pub address: String,
}

impl Branch {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

/// A single attendance event (clock-in / clock-out)
///
/// Serialized with camelCase keys, which is the shape the ingestion API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchRecord {
    /// Device-internal user serial number
    pub user_sn: u16,

    /// User enrolment id on the terminal
    pub device_user_id: String,

    /// When the punch happened (device local time)
    pub record_time: Timestamp,

    /// Verification method / status byte
    #[serde(default)]
    pub verify_type: u8,

    /// Punch state byte (check-in, check-out, ...)
    #[serde(default)]
    pub punch_state: u8,

    /// Address of the terminal that produced the record
    #[serde(default)]
    pub ip: String,
}

impl PunchRecord {
    /// Minimal record, mostly useful for fixtures
    pub fn new(device_user_id: impl Into<String>, record_time: Timestamp) -> Self {
        Self {
            user_sn: 0,
            device_user_id: device_user_id.into(),
            record_time,
            verify_type: 0,
            punch_state: 0,
            ip: String::new(),
        }
    }

    /// Attach the source terminal address
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }
}
