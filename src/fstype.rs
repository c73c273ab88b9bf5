//! Filesystem-type labels and the tag-keyed geometry tables CRC verification
//! needs (UBIFS logical-erase-block size, raw-NAND page/OOB split).

use crate::error::{Error, Result};

/// A FAMILY-A/FAMILY-B `fstype` code, resolved to the label the FAMILY-A
/// extractor table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    None,
    Msdos,
    Yaffs,
    Nand,
    Raw,
    Nor,
    Ubifs,
    Unknown(u32),
}

impl FsType {
    pub fn from_code(v: u32) -> Self {
        match v {
            0 => FsType::None,
            1 => FsType::Msdos,
            3 => FsType::Yaffs,
            4 => FsType::Nand,
            6 => FsType::Raw,
            7 => FsType::Nor,
            8 => FsType::Ubifs,
            other => FsType::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            FsType::None => 0,
            FsType::Msdos => 1,
            FsType::Yaffs => 3,
            FsType::Nand => 4,
            FsType::Raw => 6,
            FsType::Nor => 7,
            FsType::Ubifs => 8,
            FsType::Unknown(v) => v,
        }
    }

    pub fn label(self) -> String {
        match self {
            FsType::None => "none".to_string(),
            FsType::Msdos => "msdos".to_string(),
            FsType::Yaffs => "yaffs".to_string(),
            FsType::Nand => "nand".to_string(),
            FsType::Raw => "raw".to_string(),
            FsType::Nor => "nor".to_string(),
            FsType::Ubifs => "ubifs".to_string(),
            FsType::Unknown(v) => format!("unknown{v}"),
        }
    }

    /// Parses a label as emitted by `label()` (manifest `fstype=` values),
    /// including the `unknown<N>` fallback form.
    pub fn from_label(s: &str) -> Result<Self> {
        Ok(match s {
            "none" => FsType::None,
            "msdos" => FsType::Msdos,
            "yaffs" => FsType::Yaffs,
            "nand" => FsType::Nand,
            "raw" => FsType::Raw,
            "nor" => FsType::Nor,
            "ubifs" => FsType::Ubifs,
            s if s.starts_with("unknown") => {
                let n: u32 = s[7..].parse().map_err(|_| Error::BadManifest {
                    path: String::new(),
                    line: 0,
                    msg: format!("invalid fstype label: {s}"),
                })?;
                FsType::Unknown(n)
            }
            other => {
                return Err(Error::BadManifest {
                    path: String::new(),
                    line: 0,
                    msg: format!("unrecognised filesystem type: {other}"),
                });
            }
        })
    }
}

/// Default UBIFS logical-erase-block size, used for any tag not present in
/// `leb_size_for_tag`'s table.
pub const DEFAULT_LEB_SIZE: u32 = 252 * 1024;

/// Resolves a FAMILY-A header tag to the LEB size its UBIFS CRC driver folds.
pub fn leb_size_for_tag(tag: &str) -> u32 {
    match tag {
        "np1300" | "np1500" => 252 * 1024,
        "np1501" | "np1380" | "np2150" => 504 * 1024,
        _ => DEFAULT_LEB_SIZE,
    }
}

/// Raw-NAND page/OOB geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NandGeometry {
    pub page: u32,
    pub oob: u32,
}

/// Resolves a FAMILY-A header tag to its NAND page/OOB geometry, or
/// `UnknownNandTag` if the tag has none on record (NAND CRC cannot be
/// computed without it).
pub fn nand_geometry_for_tag(tag: &str) -> Result<NandGeometry> {
    match tag {
        "np1100" => Ok(NandGeometry {
            page: 2048,
            oob: 64,
        }),
        other => Err(Error::UnknownNandTag {
            tag: other.to_string(),
        }),
    }
}
