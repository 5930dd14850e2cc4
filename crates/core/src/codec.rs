//! Record codec
//!
//! Serializes one [`LogRecord`] into a self-describing byte block and back.
//!
//! # Record Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Fixed header (128 bytes, little-endian)      │
//! ├──────────────────────────────────────────────┤
//! │ message │ detail │ ... │ query   (variable)  │
//! └──────────────────────────────────────────────┘
//!
//! Header:
//!   0  magic            u32   0x06054AB5
//!   4  total_len        u32   header + all text bytes
//!   8  logtime          i64   microseconds since the Unix epoch
//!  16  session_start    i64   0 = absent
//!  24  severity         i32
//!  28  saved_errno      i32
//!  32  error_code       i32   packed SQLSTATE
//!  36  text lengths     14 x u32, canonical order, 0 = absent
//!  92  query_position   i32
//!  96  internal_pos     i32
//! 100  pid              i32
//! 104  database_id      u32   0 = absent
//! 108  user_id          u32   0 = absent
//! 112  transaction_id   u32   0 = absent
//! 116  reserved         u32
//! 120  sequence         u64
//! ```
//!
//! Text bytes follow the header back to back, with no padding, in the
//! order of [`TextField::ALL`]. Decoding always works on a contiguous copy;
//! reassembling records that straddle the end of the region is the ring's
//! job, not the codec's.

use crate::error::{Error, Result};
use crate::record::{LogRecord, TextField, TextFields};
use crate::severity::Severity;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use std::io::{Cursor, Read, Write};

/// Guard value at the start of every record
pub const RECORD_MAGIC: u32 = 0x0605_4AB5;

/// Size of the fixed record header in bytes
pub const RECORD_HEADER_SIZE: usize = 128;

/// Number of leading header bytes needed to learn a record's size
pub const RECORD_PEEK_SIZE: usize = 8;

/// Serialized size of a record, header included.
pub fn encoded_len(record: &LogRecord) -> usize {
    RECORD_HEADER_SIZE
        + TextField::ALL
            .iter()
            .map(|f| record.texts.stored_len(*f))
            .sum::<usize>()
}

/// Serialize a record for a region whose data array holds `capacity` bytes.
///
/// # Errors
///
/// `RecordTooLarge` when the serialized size is not strictly smaller than
/// `capacity`; nothing is produced in that case.
pub fn encode(record: &LogRecord, capacity: usize) -> Result<Vec<u8>> {
    let total_len = encoded_len(record);
    if total_len >= capacity || total_len > u32::MAX as usize {
        return Err(Error::RecordTooLarge {
            size: total_len,
            capacity,
        });
    }

    let mut buf = Vec::with_capacity(total_len);
    buf.write_u32::<LittleEndian>(RECORD_MAGIC)?;
    buf.write_u32::<LittleEndian>(total_len as u32)?;
    buf.write_i64::<LittleEndian>(record.logtime.timestamp_micros())?;
    buf.write_i64::<LittleEndian>(record.session_start.map_or(0, |t| t.timestamp_micros()))?;
    buf.write_i32::<LittleEndian>(record.severity.code())?;
    buf.write_i32::<LittleEndian>(record.saved_errno)?;
    buf.write_i32::<LittleEndian>(record.error_code)?;
    for field in TextField::ALL {
        buf.write_u32::<LittleEndian>(record.texts.stored_len(field) as u32)?;
    }
    buf.write_i32::<LittleEndian>(record.query_position)?;
    buf.write_i32::<LittleEndian>(record.internal_position)?;
    buf.write_i32::<LittleEndian>(record.pid)?;
    buf.write_u32::<LittleEndian>(record.database_id.unwrap_or(0))?;
    buf.write_u32::<LittleEndian>(record.user_id.unwrap_or(0))?;
    buf.write_u32::<LittleEndian>(record.transaction_id.unwrap_or(0))?;
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u64::<LittleEndian>(record.sequence)?;
    debug_assert_eq!(buf.len(), RECORD_HEADER_SIZE);

    for field in TextField::ALL {
        if let Some(text) = record.texts.get(field) {
            buf.write_all(text.as_bytes())?;
        }
    }
    debug_assert_eq!(buf.len(), total_len);

    Ok(buf)
}

/// Read a record's total size from its leading bytes without decoding it.
///
/// `bytes` needs at least [`RECORD_PEEK_SIZE`] bytes. The size is checked
/// against the header size and against `capacity`, since a walk that trusts
/// a bad length would misread every byte after it.
pub fn peek_total_len(bytes: &[u8], capacity: usize) -> Result<usize> {
    if bytes.len() < RECORD_PEEK_SIZE {
        return Err(Error::corrupt_record("truncated record header"));
    }
    let mut cursor = Cursor::new(bytes);
    let magic = cursor.read_u32::<LittleEndian>()?;
    if magic != RECORD_MAGIC {
        return Err(Error::corrupt_record(format!(
            "bad record magic {:#010x}",
            magic
        )));
    }
    let total_len = cursor.read_u32::<LittleEndian>()? as usize;
    if total_len < RECORD_HEADER_SIZE || total_len >= capacity {
        return Err(Error::corrupt_record(format!(
            "record length {} outside [{}, {})",
            total_len, RECORD_HEADER_SIZE, capacity
        )));
    }
    Ok(total_len)
}

fn timestamp(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::corrupt_record(format!("timestamp {} out of range", micros)))
}

/// Deserialize one record from a contiguous byte block.
///
/// Trailing bytes beyond the record's `total_len` are ignored.
///
/// # Errors
///
/// `CorruptRecord` on a guard mismatch, on text lengths that disagree with
/// `total_len` or overrun `bytes`, or on text that is not UTF-8.
pub fn decode(bytes: &[u8]) -> Result<LogRecord> {
    if bytes.len() < RECORD_HEADER_SIZE {
        return Err(Error::corrupt_record(format!(
            "{} bytes is shorter than a record header",
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let magic = cursor.read_u32::<LittleEndian>()?;
    if magic != RECORD_MAGIC {
        return Err(Error::corrupt_record(format!(
            "bad record magic {:#010x}",
            magic
        )));
    }
    let total_len = cursor.read_u32::<LittleEndian>()? as usize;
    if total_len > bytes.len() {
        return Err(Error::corrupt_record(format!(
            "record length {} exceeds the {} bytes supplied",
            total_len,
            bytes.len()
        )));
    }

    let logtime = timestamp(cursor.read_i64::<LittleEndian>()?)?;
    let session_start = match cursor.read_i64::<LittleEndian>()? {
        0 => None,
        micros => Some(timestamp(micros)?),
    };
    let severity = Severity::from_code(cursor.read_i32::<LittleEndian>()?);
    let saved_errno = cursor.read_i32::<LittleEndian>()?;
    let error_code = cursor.read_i32::<LittleEndian>()?;

    let mut lengths = [0usize; TextField::COUNT];
    for len in lengths.iter_mut() {
        *len = cursor.read_u32::<LittleEndian>()? as usize;
    }
    let query_position = cursor.read_i32::<LittleEndian>()?;
    let internal_position = cursor.read_i32::<LittleEndian>()?;
    let pid = cursor.read_i32::<LittleEndian>()?;
    let non_zero = |v: u32| if v == 0 { None } else { Some(v) };
    let database_id = non_zero(cursor.read_u32::<LittleEndian>()?);
    let user_id = non_zero(cursor.read_u32::<LittleEndian>()?);
    let transaction_id = non_zero(cursor.read_u32::<LittleEndian>()?);
    let _reserved = cursor.read_u32::<LittleEndian>()?;
    let sequence = cursor.read_u64::<LittleEndian>()?;

    let text_len: usize = lengths.iter().sum();
    if RECORD_HEADER_SIZE + text_len != total_len {
        return Err(Error::corrupt_record(format!(
            "text lengths sum to {} but record length is {}",
            text_len, total_len
        )));
    }

    let mut texts = TextFields::default();
    for (field, len) in TextField::ALL.iter().zip(lengths) {
        if len == 0 {
            continue;
        }
        let mut raw = vec![0u8; len];
        cursor.read_exact(&mut raw)?;
        let text = String::from_utf8(raw).map_err(|_| {
            Error::corrupt_record(format!("{} is not valid UTF-8", field.column_name()))
        })?;
        texts.set(*field, Some(text));
    }

    Ok(LogRecord {
        logtime,
        session_start,
        severity,
        saved_errno,
        error_code,
        sequence,
        pid,
        database_id,
        user_id,
        transaction_id,
        query_position,
        internal_position,
        texts,
    })
}
