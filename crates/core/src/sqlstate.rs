//! SQLSTATE packing
//!
//! A five-character SQLSTATE is packed into one `i32`, six bits per
//! character, first character in the lowest bits. Records store the packed
//! form as their error code.

use crate::error::{Error, Result};

/// Packed form of `00000` (successful completion)
pub const SUCCESSFUL_COMPLETION: i32 = 0;

/// Packed form of `0A000` (feature not supported)
pub const FEATURE_NOT_SUPPORTED: i32 = 17 << 6;

fn six_bit(ch: u8) -> i32 {
    (ch.wrapping_sub(b'0') & 0x3F) as i32
}

/// Pack a five-character SQLSTATE.
///
/// # Errors
///
/// `InvalidConfiguration` unless `code` is five ASCII digits or upper-case
/// letters.
pub fn pack(code: &str) -> Result<i32> {
    let bytes = code.as_bytes();
    if bytes.len() != 5
        || !bytes
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    {
        return Err(Error::invalid_config(format!(
            "invalid SQLSTATE '{}'",
            code
        )));
    }
    Ok(bytes
        .iter()
        .enumerate()
        .fold(0, |acc, (i, b)| acc | (six_bit(*b) << (6 * i))))
}

/// Unpack a stored error code into its five-character SQLSTATE.
pub fn unpack(packed: i32) -> String {
    (0..5)
        .map(|i| (((packed >> (6 * i)) & 0x3F) as u8 + b'0') as char)
        .collect()
}
