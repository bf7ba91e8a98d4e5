//! Attendance protocol framing
//!
//! TCP frame layout (all little endian):
//!
//! ```text
//! | 50 50 82 7D | len u32 | command u16 | checksum u16 | session u16 | reply u16 | data .. |
//! |<-- prefix (8 bytes) ->|<------------- header (8 bytes) --------------------->|
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DeviceError, Result};

pub const CMD_CONNECT: u16 = 1000;
pub const CMD_EXIT: u16 = 1001;
pub const CMD_PREPARE_DATA: u16 = 1500;
pub const CMD_DATA: u16 = 1501;
pub const CMD_FREE_DATA: u16 = 1502;
pub const CMD_DATA_WRRQ: u16 = 1503;
pub const CMD_DATA_RDY: u16 = 1504;
pub const CMD_ACK_OK: u16 = 2000;
pub const CMD_ACK_UNAUTH: u16 = 2005;

/// Buffered-read request selecting the attendance log table
pub const ATTENDANCE_REQUEST: [u8; 11] = [0x01, 0x0d, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Largest chunk requested with `CMD_DATA_RDY`
pub const MAX_CHUNK: u32 = 65472;

pub const TCP_MAGIC: [u8; 4] = [0x50, 0x50, 0x82, 0x7d];
pub const PREFIX_LEN: usize = 8;
pub const HEADER_LEN: usize = 8;

/// Upper bound for a single frame body, guards against corrupt length fields
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Largest buffered-read size accepted from a terminal (about 400k records)
pub const MAX_BUFFER_LEN: u32 = 16 * 1024 * 1024;

const USHRT_MAX: u32 = 65535;

/// Decoded frame body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: u16,
    pub checksum: u16,
    pub session_id: u16,
    pub reply_id: u16,
    pub data: Bytes,
}

impl Packet {
    /// Decode a frame body (everything after the 8-byte prefix)
    pub fn parse(body: Bytes) -> Result<Self> {
        if body.len() < HEADER_LEN {
            return Err(DeviceError::protocol(format!(
                "frame body too short: {} bytes",
                body.len()
            )));
        }

        Ok(Self {
            command: u16::from_le_bytes([body[0], body[1]]),
            checksum: u16::from_le_bytes([body[2], body[3]]),
            session_id: u16::from_le_bytes([body[4], body[5]]),
            reply_id: u16::from_le_bytes([body[6], body[7]]),
            data: body.slice(HEADER_LEN..),
        })
    }
}

/// Validate the TCP prefix and return the body length it announces
pub fn parse_prefix(prefix: &[u8; PREFIX_LEN]) -> Result<usize> {
    if prefix[..4] != TCP_MAGIC {
        return Err(DeviceError::protocol(format!(
            "bad frame magic: {:02x?}",
            &prefix[..4]
        )));
    }

    let len = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]) as usize;
    if !(HEADER_LEN..=MAX_FRAME_LEN).contains(&len) {
        return Err(DeviceError::protocol(format!("bad frame length: {len}")));
    }
    Ok(len)
}

/// Protocol checksum over a header + data buffer
///
/// Sums little endian words modulo 65535, a trailing odd byte is added on its own.
pub fn checksum(buf: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for word in buf.chunks(2) {
        let value = match word {
            [lo, hi] => u16::from_le_bytes([*lo, *hi]) as u32,
            [last] => *last as u32,
            _ => 0,
        };
        sum = (sum + value) % USHRT_MAX;
    }
    (USHRT_MAX - sum - 1) as u16
}

/// Next reply id, wrapping at 65535
pub fn next_reply_id(reply_id: u16) -> u16 {
    ((reply_id as u32 + 1) % USHRT_MAX) as u16
}

/// Encode a complete TCP frame
///
/// The checksum covers the header carrying `reply_id`; the header then goes
/// out with the incremented reply id, which is what terminals expect.
pub fn encode(command: u16, session_id: u16, reply_id: u16, data: &[u8]) -> BytesMut {
    let mut body = BytesMut::with_capacity(HEADER_LEN + data.len());
    body.put_u16_le(command);
    body.put_u16_le(0);
    body.put_u16_le(session_id);
    body.put_u16_le(reply_id);
    body.put_slice(data);

    let sum = checksum(&body);
    body[2..4].copy_from_slice(&sum.to_le_bytes());
    body[6..8].copy_from_slice(&next_reply_id(reply_id).to_le_bytes());

    let mut frame = BytesMut::with_capacity(PREFIX_LEN + body.len());
    frame.put_slice(&TCP_MAGIC);
    frame.put_u32_le(body.len() as u32);
    frame.put(body);
    frame
}
