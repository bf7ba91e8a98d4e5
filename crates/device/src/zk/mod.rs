//! Attendance terminal TCP protocol
//!
//! Framing and command codes in [`packet`], record layout in [`record`],
//! session handling in [`client`].

pub mod client;
pub mod packet;
pub mod record;

pub use client::{ZkClient, ZkConnector, ZkTransport};
