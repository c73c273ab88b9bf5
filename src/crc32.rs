//! Standard IEEE CRC-32 (polynomial `0xEDB88320`), plus the three
//! filesystem-aware driver variants FAMILY-A payload verification uses.

use std::io::Read;

use crate::error::Result;
use crate::fstype::{FsType, NandGeometry, leb_size_for_tag, nand_geometry_for_tag};

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = build_table();

/// Raw reflected CRC-32 register update: folds `buf` into `reg`, which is
/// the bare working register (neither the initial nor the final XOR is
/// applied — that's `crc_np`'s job, which is what makes chained calls
/// composable; see `crc_np`'s doc).
fn raw_update(reg: u32, buf: &[u8]) -> u32 {
    let mut c = reg;
    for &b in buf {
        c = TABLE[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c
}

/// `crc_np(c, b) = 0xFFFFFFFF XOR crc32(c XOR 0xFFFFFFFF, b)`: starts and
/// ends the accumulator in non-inverted form, so repeated calls compose
/// cleanly — `crc_np(crc_np(0, a), b) == crc_np(0, concat(a, b))`.
pub fn crc_np(acc: u32, buf: &[u8]) -> u32 {
    !raw_update(!acc, buf)
}

const PLAIN_BLOCK: usize = 4 * 1024 * 1024;

/// Plain CRC driver: every byte of `size` bytes read from `r` is folded in,
/// 4 MiB at a time.
pub fn crc_plain<R: Read>(r: &mut R, size: u64) -> Result<u32> {
    let mut acc = 0u32;
    let mut buf = vec![0u8; PLAIN_BLOCK];
    let mut remaining = size;
    while remaining > 0 {
        let want = remaining.min(PLAIN_BLOCK as u64) as usize;
        let got = read_some(r, &mut buf[..want])?;
        if got == 0 {
            break;
        }
        acc = crc_np(acc, &buf[..got]);
        remaining -= got as u64;
    }
    Ok(acc)
}

/// UBIFS CRC driver: reads blocks of `leb_size + 4` bytes, skips the first 4
/// bytes of each block (the unmapped-LEB counter), and folds the remaining
/// `leb_size` bytes in only if they are not entirely `0xFF` (the unmapped
/// marker).
pub fn crc_ubifs<R: Read>(r: &mut R, size: u64, leb_size: u32) -> Result<u32> {
    let block = leb_size as u64 + 4;
    let mut acc = 0u32;
    let mut buf = vec![0u8; block as usize];
    let mut remaining = size;
    while remaining >= 4 {
        let want = remaining.min(block) as usize;
        let got = read_some(r, &mut buf[..want])?;
        if got < 4 {
            break;
        }
        let data = &buf[4..got];
        if !data.iter().all(|&b| b == 0xFF) {
            acc = crc_np(acc, data);
        }
        remaining -= got as u64;
    }
    Ok(acc)
}

/// NAND CRC driver: reads blocks of `page + oob` bytes, folding only the
/// first `page` bytes of each block (the OOB spare area is ignored).
pub fn crc_nand<R: Read>(r: &mut R, size: u64, geometry: NandGeometry) -> Result<u32> {
    let block = geometry.page as u64 + geometry.oob as u64;
    let mut acc = 0u32;
    let mut buf = vec![0u8; block as usize];
    let mut remaining = size;
    while remaining >= 4 {
        let want = remaining.min(block) as usize;
        let got = read_some(r, &mut buf[..want])?;
        if got == 0 {
            break;
        }
        let take = got.min(geometry.page as usize);
        acc = crc_np(acc, &buf[..take]);
        remaining -= got as u64;
    }
    Ok(acc)
}

/// Selects and runs the CRC driver appropriate for `fstype`, resolving
/// UBIFS/NAND geometry from `tag`.
pub fn crc_for_fstype<R: Read>(r: &mut R, size: u64, fstype: FsType, tag: &str) -> Result<u32> {
    match fstype {
        FsType::Ubifs => crc_ubifs(r, size, leb_size_for_tag(tag)),
        FsType::Nand => crc_nand(r, size, nand_geometry_for_tag(tag)?),
        _ => crc_plain(r, size),
    }
}

/// Reads up to `buf.len()` bytes, returning fewer only at EOF (never on a
/// merely short individual `read`).
fn read_some<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
