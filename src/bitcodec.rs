//! Bit-pair swap obfuscation used to scramble/descramble the FAMILY-A header.
//!
//! The transform is its own inverse: applying it twice returns the original
//! buffer. Ported from the original `charcodec`/`codec` bit-twiddling (swap
//! every two adjacent bits), but operated on 64 bits at a time as the source
//! itself does.

use crate::error::{Error, Result};

const MASK_HI: u64 = 0xAAAA_AAAA_AAAA_AAAA;
const MASK_LO: u64 = 0x5555_5555_5555_5555;

/// Swaps every pair of adjacent bits in `buf`, in place.
///
/// `buf.len()` must be a multiple of 8 bytes.
pub fn bit_swap(buf: &mut [u8]) -> Result<()> {
    if buf.len() % 8 != 0 {
        return Err(Error::BadAlignment { len: buf.len() });
    }
    for chunk in buf.chunks_exact_mut(8) {
        let v = u64::from_le_bytes(chunk.try_into().unwrap());
        let swapped = ((v & MASK_HI) >> 1) | ((v & MASK_LO) << 1);
        chunk.copy_from_slice(&swapped.to_le_bytes());
    }
    Ok(())
}
