//! The fixed 2048-byte FAMILY-A header: one tag slot followed by 31 package
//! slots of 64 bytes each, little-endian on disk.
//!
//! Modelled as an owned value with `binrw` derive macros, no packed unions
//! or pointer casts.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use binrw::{BinRead, BinWrite};

use crate::bitcodec::bit_swap;
use crate::error::{Error, Result};
use crate::fstype::FsType;

pub const HEADER_SIZE: usize = 2048;
pub const TAG_LEN: usize = 8;
pub const DEV_LEN: usize = 44;
pub const SLOT_COUNT: usize = 31;

#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct PkgSlot {
    pub size: u32,
    pub offset: u32,
    pub ver: u32,
    pub fstype: u32,
    pub crc: u32,
    pub dev: [u8; DEV_LEN],
}

impl Default for PkgSlot {
    fn default() -> Self {
        PkgSlot {
            size: 0,
            offset: 0,
            ver: 0,
            fstype: 0,
            crc: 0,
            dev: [0; DEV_LEN],
        }
    }
}

impl PkgSlot {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn dev_str(&self) -> &str {
        trim_nul(&self.dev)
    }

    pub fn set_dev(&mut self, dev: &str) {
        ascii_into(&mut self.dev, dev);
    }

    pub fn fstype(&self) -> FsType {
        FsType::from_code(self.fstype)
    }
}

#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct HeaderA {
    tag: [u8; TAG_LEN],
    pub ver: u32,
    reserved: [u8; 52],
    slots: [PkgSlot; SLOT_COUNT],
}

impl Default for HeaderA {
    fn default() -> Self {
        HeaderA {
            tag: [0; TAG_LEN],
            ver: 0,
            reserved: [0; 52],
            slots: std::array::from_fn(|_| PkgSlot::default()),
        }
    }
}

impl HeaderA {
    pub fn new(tag: &str, ver: u32) -> Self {
        let mut h = HeaderA::default();
        h.set_tag(tag);
        h.ver = ver;
        h
    }

    pub fn tag_str(&self) -> &str {
        trim_nul(&self.tag)
    }

    pub fn set_tag(&mut self, tag: &str) {
        ascii_into(&mut self.tag, tag);
    }

    /// Slots are numbered 1..=31, matching the on-disk slot index.
    pub fn slot(&self, idx: u32) -> &PkgSlot {
        &self.slots[idx as usize - 1]
    }

    pub fn slot_mut(&mut self, idx: u32) -> &mut PkgSlot {
        &mut self.slots[idx as usize - 1]
    }

    pub fn slots(&self) -> impl Iterator<Item = (u32, &PkgSlot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32 + 1, s))
    }

    /// Encodes the header to its 2048-byte on-disk representation. Does
    /// *not* scramble it; callers pass the result through
    /// `bitcodec::bit_swap` themselves.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write_le(&mut cursor)
            .map_err(|e| Error::Codec { detail: e.to_string() })?;
        let buf = cursor.into_inner();
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&buf);
        Ok(out)
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut cursor = Cursor::new(buf.as_slice());
        HeaderA::read_le(&mut cursor).map_err(|e| Error::Codec { detail: e.to_string() })
    }

    /// Reads and descrambles the 2048-byte header at the start of the image
    /// at `path`. Shared by ExtractorA and the `info` binary.
    pub fn read_from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buf = [0u8; HEADER_SIZE];
        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        if total < HEADER_SIZE {
            return Err(Error::Truncated {
                where_: "header".to_string(),
                expected: HEADER_SIZE,
                got: total,
            });
        }
        bit_swap(&mut buf)?;
        HeaderA::from_bytes(&buf)
    }
}

fn trim_nul(bytes: &[u8]) -> &str {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..len]).unwrap_or("")
}

fn ascii_into(dst: &mut [u8], src: &str) {
    dst.fill(0);
    let bytes = src.as_bytes();
    let n = bytes.len().min(dst.len());
    dst[..n].copy_from_slice(&bytes[..n]);
}
