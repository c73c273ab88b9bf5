//! Repeating-pattern XOR obfuscation used for the FAMILY-B body.

use crate::error::{Error, Result};

/// 64-byte XOR key ("Pattern-B") used to descramble FAMILY-B's fixed
/// sections and, when the setup descriptor is the full variant, its
/// compressed device-payload chunk framing.
#[rustfmt::skip]
pub const PATTERN_B: [u8; 64] = [
    0x38, 0x20, 0x08, 0x31, 0x19, 0x01, 0x2A, 0x12, 0x3B, 0x23, 0x2E, 0x16, 0x3D, 0x25, 0x0D, 0x34,
    0x1C, 0x04, 0x0B, 0x10, 0x00, 0x1B, 0x28, 0x10, 0x39, 0x21, 0x09, 0x32, 0x1A, 0x02, 0x2B, 0x36,
    0x1E, 0x06, 0x2D, 0x15, 0x3C, 0x24, 0x0C, 0x13, 0x0D, 0x17, 0x02, 0x30, 0x18, 0x00, 0x29, 0x11,
    0x3A, 0x22, 0x0A, 0x33, 0x3E, 0x26, 0x0E, 0x35, 0x1D, 0x05, 0x2C, 0x14, 0x1B, 0x03, 0x0A, 0x04,
];

/// XORs `buf` against `pattern`, repeating `pattern` as needed, in place.
///
/// Both `buf.len()` and `pattern.len()` must be multiples of 8 bytes.
pub fn xor_pattern(buf: &mut [u8], pattern: &[u8]) -> Result<()> {
    if buf.len() % 8 != 0 {
        return Err(Error::BadAlignment { len: buf.len() });
    }
    if pattern.is_empty() || pattern.len() % 8 != 0 {
        return Err(Error::BadAlignment { len: pattern.len() });
    }
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= pattern[i % pattern.len()];
    }
    Ok(())
}

/// Expands a single byte to an 8-byte repeating pattern, the framing FAMILY-B
/// device payloads use when `dev.pattern` is a scalar rather than Pattern-B.
pub fn single_byte_pattern(byte: u32) -> [u8; 8] {
    [byte as u8; 8]
}

/// Byte-wise XOR against a repeating `pattern`, without the 8-byte alignment
/// precondition `xor_pattern` enforces. Device payload sizes aren't
/// guaranteed to be 8-byte multiples, so this is what FAMILY-B payload
/// framing uses.
pub fn xor_pattern_relaxed(buf: &mut [u8], pattern: &[u8]) {
    if pattern.is_empty() {
        return;
    }
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= pattern[i % pattern.len()];
    }
}
