//! Parses and emits the line-oriented, ASCII, INI-like manifest that
//! mediates FAMILY-A create/extract.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::fstype::FsType;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub tag: String,
    pub ver: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgRecord {
    pub idx: u32,
    pub file: String,
    pub ver: u32,
    pub dev: String,
    pub fstype: FsType,
    /// `crc=` override when present on read; the `# crc=` comment value when
    /// this record was produced by `write_pkg` (informational only, never
    /// re-applied as an override on the next parse).
    pub crc: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub header: HeaderFields,
    /// Only `include != 0` blocks, in the order they appeared in the file.
    pub packages: Vec<PkgRecord>,
}

#[derive(Default)]
struct PendingPkg {
    idx: Option<u32>,
    include: u32,
    file: Option<String>,
    ver: Option<u32>,
    dev: Option<String>,
    fstype: Option<FsType>,
    crc: Option<u32>,
}

enum Section {
    Header,
    Pkg,
}

/// Parses `text` (the manifest file's contents) into a `Manifest`. `path` is
/// used only to annotate error messages with a file name.
pub fn parse(text: &str, path: &str) -> Result<Manifest> {
    let mut header = HeaderFields::default();
    let mut packages = Vec::new();
    let mut section = Section::Header;
    let mut pending = PendingPkg::default();

    let flush = |pending: &mut PendingPkg, packages: &mut Vec<PkgRecord>, line: usize| -> Result<()> {
        if pending.include != 0 {
            let idx = pending.idx.ok_or_else(|| bad(path, line, "pkg block missing idx="))?;
            if !(1..=31).contains(&idx) {
                return Err(bad(path, line, &format!("idx {idx} out of range 1..31")));
            }
            let file = pending
                .file
                .clone()
                .ok_or_else(|| bad(path, line, "pkg block missing file="))?;
            let ver = pending.ver.unwrap_or(0);
            let dev = pending.dev.clone().unwrap_or_default();
            let fstype = pending.fstype.unwrap_or(FsType::None);
            packages.push(PkgRecord {
                idx,
                file,
                ver,
                dev,
                fstype,
                crc: pending.crc,
            });
        }
        *pending = PendingPkg::default();
        Ok(())
    };

    for (lnum0, raw_line) in text.lines().enumerate() {
        let lnum = lnum0 + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "[header]" {
            flush(&mut pending, &mut packages, lnum)?;
            section = Section::Header;
            continue;
        }
        if line == "[pkg]" {
            flush(&mut pending, &mut packages, lnum)?;
            section = Section::Pkg;
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| bad(path, lnum, &format!("unrecognised line: {line}")))?;

        match section {
            Section::Header => match key {
                "tag" => header.tag = value.to_string(),
                "ver" => header.ver = parse_uint(value).map_err(|_| bad(path, lnum, &format!("invalid ver: {value}")))?,
                other => return Err(bad(path, lnum, &format!("unrecognised header key: {other}"))),
            },
            Section::Pkg => match key {
                "name" => {} // decorative, not stored
                "idx" => {
                    pending.idx = Some(
                        parse_uint(value).map_err(|_| bad(path, lnum, &format!("invalid idx: {value}")))?,
                    )
                }
                "include" => {
                    pending.include =
                        parse_uint(value).map_err(|_| bad(path, lnum, &format!("invalid include: {value}")))?
                }
                "file" => pending.file = Some(value.to_string()),
                "ver" => {
                    pending.ver = Some(
                        parse_uint(value).map_err(|_| bad(path, lnum, &format!("invalid ver: {value}")))?,
                    )
                }
                "dev" => pending.dev = Some(value.to_string()),
                "fstype" => {
                    pending.fstype = Some(
                        FsType::from_label(value).map_err(|_| bad(path, lnum, &format!("invalid fstype: {value}")))?,
                    )
                }
                "crc" => {
                    pending.crc = Some(
                        parse_uint(value).map_err(|_| bad(path, lnum, &format!("invalid crc: {value}")))?,
                    )
                }
                other => return Err(bad(path, lnum, &format!("unrecognised pkg key: {other}"))),
            },
        }
    }
    flush(&mut pending, &mut packages, text.lines().count() + 1)?;

    Ok(Manifest { header, packages })
}

fn bad(path: &str, line: usize, msg: &str) -> Error {
    Error::BadManifest {
        path: path.to_string(),
        line,
        msg: msg.to_string(),
    }
}

fn parse_uint(s: &str) -> std::result::Result<u32, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

/// Renders the `[header]` block: `tag=<str>` then `ver=0x<8 hex digits>`.
pub fn write_header(out: &mut String, header: &HeaderFields) {
    let _ = writeln!(out, "[header]");
    let _ = writeln!(out, "tag={}", header.tag);
    let _ = writeln!(out, "ver={:#010x}", header.ver);
}

/// Renders one `[pkg]` block in ExtractorA's format: `name=sgmnt<NN>`,
/// `idx=`, `include=1`, `file=`, hex `ver=`, `dev=`, `fstype=`, and a
/// trailing `# crc=0x<8 hex digits>` comment.
pub fn write_pkg(out: &mut String, idx: u32, ver: u32, dev: &str, fstype: FsType, crc: u32) {
    let _ = writeln!(out);
    let _ = writeln!(out, "[pkg]");
    let _ = writeln!(out, "name=sgmnt{idx:02}");
    let _ = writeln!(out, "idx={idx}");
    let _ = writeln!(out, "include=1");
    let _ = writeln!(out, "file=segment{idx:02}.bin");
    let _ = writeln!(out, "ver={ver:#010x}");
    let _ = writeln!(out, "dev={dev}");
    let _ = writeln!(out, "fstype={}", fstype.label());
    let _ = writeln!(out, "# crc={crc:#010x}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let text = "[header]\ntag=np1500\nver=0x00000001\n\n[pkg]\nidx=1\ninclude=1\nfile=a.bin\nver=0x2\ndev=/dev/mtd0\nfstype=raw\n";
        let m = parse(text, "m.cfg").unwrap();
        assert_eq!(m.header.tag, "np1500");
        assert_eq!(m.header.ver, 1);
        assert_eq!(m.packages.len(), 1);
        assert_eq!(m.packages[0].idx, 1);
        assert_eq!(m.packages[0].fstype, FsType::Raw);
    }

    #[test]
    fn excludes_not_included_blocks() {
        let text = "[header]\ntag=np1500\nver=0x1\n\n[pkg]\nidx=1\ninclude=0\nfile=a.bin\n";
        let m = parse(text, "m.cfg").unwrap();
        assert!(m.packages.is_empty());
    }

    #[test]
    fn last_idx_wins_on_duplicate() {
        let text = "[header]\ntag=np1500\nver=0x1\n\n\
            [pkg]\nidx=1\ninclude=1\nfile=a.bin\nver=0x1\n\n\
            [pkg]\nidx=1\ninclude=1\nfile=b.bin\nver=0x2\n";
        let m = parse(text, "m.cfg").unwrap();
        assert_eq!(m.packages.len(), 2);
        assert_eq!(m.packages[0].file, "a.bin");
        assert_eq!(m.packages[1].file, "b.bin");
    }

    #[test]
    fn unrecognised_key_is_an_error() {
        let text = "[header]\ntag=np1500\nbogus=1\n";
        let err = parse(text, "m.cfg").unwrap_err();
        match err {
            Error::BadManifest { line, .. } => assert_eq!(line, 2),
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn accepts_crlf_tolerantly() {
        let text = "[header]\r\ntag=np1500\r\nver=0x1\r\n";
        let m = parse(text, "m.cfg").unwrap();
        assert_eq!(m.header.tag, "np1500");
    }

    #[test]
    fn emits_extract_manifest_formatting() {
        let mut out = String::new();
        write_header(
            &mut out,
            &HeaderFields {
                tag: "np1100".to_string(),
                ver: 0x7,
            },
        );
        write_pkg(&mut out, 1, 0x3, "/dev/mtd3", FsType::Ubifs, 0xDEADBEEF);
        assert_eq!(
            out,
            "[header]\ntag=np1100\nver=0x00000007\n\n[pkg]\nname=sgmnt01\n\
             idx=1\ninclude=1\nfile=segment01.bin\nver=0x00000003\ndev=/dev/mtd3\n\
             fstype=ubifs\n# crc=0xdeadbeef\n"
        );
    }
}
