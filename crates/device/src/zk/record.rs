//! Attendance record decoding
//!
//! The attendance buffer starts with a 4-byte size field followed by 40-byte records:
//!
//! ```text
//! | user_sn u16 | user_id [u8; 24] | verify u8 | time u32 | state u8 | reserved [u8; 8] |
//! 0             2                  26          27         31         32                40
//! ```

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use contracts::PunchRecord;
use tracing::warn;

pub const RECORD_SIZE: usize = 40;

const SIZE_FIELD_LEN: usize = 4;

/// Decode the terminal's packed timestamp
///
/// Days overflowing a month roll into the next one, as the terminal firmware does.
pub fn decode_time(raw: u32) -> Option<NaiveDateTime> {
    let mut t = raw;
    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % 31 + 1;
    t /= 31;
    let month = t % 12 + 1;
    t /= 12;
    let year = i32::try_from(t).ok()? + 2000;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(day - 1)))?
        .and_hms_opt(hour, minute, second)
}

/// Pack a timestamp the way the terminal stores it
///
/// Used by terminal simulators; years before 2000 are not representable.
pub fn encode_time(time: &NaiveDateTime) -> u32 {
    let years = (time.year() - 2000).max(0) as u32;
    let days = (years * 12 + time.month0()) * 31 + time.day0();
    ((days * 24 + time.hour()) * 60 + time.minute()) * 60 + time.second()
}

/// Decode one 40-byte record
pub fn decode_record(raw: &[u8], ip: &str) -> Option<PunchRecord> {
    if raw.len() < RECORD_SIZE {
        return None;
    }

    let user_id_bytes = &raw[2..26];
    let user_id_len = user_id_bytes
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(user_id_bytes.len());
    let device_user_id = String::from_utf8_lossy(&user_id_bytes[..user_id_len])
        .trim()
        .to_string();

    let time_raw = u32::from_le_bytes([raw[27], raw[28], raw[29], raw[30]]);

    Some(PunchRecord {
        user_sn: u16::from_le_bytes([raw[0], raw[1]]),
        device_user_id,
        record_time: decode_time(time_raw)?,
        verify_type: raw[26],
        punch_state: raw[31],
        ip: ip.to_string(),
    })
}

/// Encode one record into its 40-byte wire form
///
/// Used by terminal simulators. User ids longer than 23 bytes are truncated.
pub fn encode_record(record: &PunchRecord) -> [u8; RECORD_SIZE] {
    let mut raw = [0u8; RECORD_SIZE];
    raw[0..2].copy_from_slice(&record.user_sn.to_le_bytes());

    let user_id = record.device_user_id.as_bytes();
    let len = user_id.len().min(23);
    raw[2..2 + len].copy_from_slice(&user_id[..len]);

    raw[26] = record.verify_type;
    raw[27..31].copy_from_slice(&encode_time(&record.record_time).to_le_bytes());
    raw[31] = record.punch_state;
    raw
}

/// Decode a complete attendance buffer (size field included)
///
/// Trailing bytes shorter than one record are ignored. Records whose
/// timestamp cannot be represented are skipped with a warning.
pub fn decode_records(buffer: &[u8], ip: &str) -> Vec<PunchRecord> {
    if buffer.len() < SIZE_FIELD_LEN {
        return Vec::new();
    }

    buffer[SIZE_FIELD_LEN..]
        .chunks_exact(RECORD_SIZE)
        .filter_map(|raw| {
            let record = decode_record(raw, ip);
            if record.is_none() {
                warn!(ip = %ip, "Skipping attendance record with invalid timestamp");
            }
            record
        })
        .collect()
}

/// Build an attendance buffer (size field included) from records
///
/// Used by terminal simulators.
pub fn encode_records(records: &[PunchRecord]) -> Vec<u8> {
    let payload_len = records.len() * RECORD_SIZE;
    let mut buffer = Vec::with_capacity(SIZE_FIELD_LEN + payload_len);
    buffer.extend_from_slice(&(payload_len as u32).to_le_bytes());
    for record in records {
        buffer.extend_from_slice(&encode_record(record));
    }
    buffer
}
