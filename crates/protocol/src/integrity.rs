//! Payload checksum
//!
//! ADB covers each payload with an additive checksum: the sum of all payload
//! bytes, wrapping at 2^32. It catches truncation and gross corruption, it
//! does not authenticate anything.

/// Sum all bytes of `data`, wrapping at 2^32
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |sum, &byte| sum.wrapping_add(u32::from(byte)))
}

/// Verify that `data` sums to `expected_checksum`
#[inline]
pub fn verify_checksum(data: &[u8], expected_checksum: u32) -> bool {
    checksum(data) == expected_checksum
}
