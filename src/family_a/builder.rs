//! BuilderA: manifest + input files → FAMILY-A image.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use crate::bitcodec::bit_swap;
use crate::crc32::crc_for_fstype;
use crate::error::Result;
use crate::family_a::header::{HEADER_SIZE, HeaderA};
use crate::manifest;

const PAYLOAD_ALIGN: u64 = 512;

fn align_up(n: u64, align: u64) -> u64 {
    n.div_ceil(align) * align
}

/// Builds a FAMILY-A image at `output_path` from the manifest at
/// `manifest_path`, returning the descrambled header that was written (for
/// tests and for logging). Files referenced by `file=` are resolved
/// relative to the manifest's parent directory.
pub fn build(manifest_path: &Path, output_path: &Path) -> Result<HeaderA> {
    let text = fs::read_to_string(manifest_path)?;
    let manifest = manifest::parse(&text, &manifest_path.display().to_string())?;
    let parent = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut out = File::create(output_path)?;
    out.write_all(&[0u8; HEADER_SIZE])?;

    let mut header = HeaderA::new(&manifest.header.tag, manifest.header.ver);
    let tag = header.tag_str().to_string();

    for pkg in &manifest.packages {
        let file_path = parent.join(&pkg.file);
        let mut input = File::open(&file_path)?;
        let file_len = input.metadata()?.len();

        let offset = out.stream_position()?;
        io::copy(&mut input, &mut out)?;
        let padded = align_up(file_len, PAYLOAD_ALIGN);
        let pad = padded - file_len;
        if pad > 0 {
            out.write_all(&vec![0u8; pad as usize])?;
        }

        input.seek(SeekFrom::Start(0))?;
        let mut crc = crc_for_fstype(&mut input, file_len, pkg.fstype, &tag)?;
        if let Some(overridden) = pkg.crc {
            crc = overridden;
        }

        let slot = header.slot_mut(pkg.idx);
        slot.size = file_len as u32;
        slot.offset = offset as u32;
        slot.ver = pkg.ver;
        slot.fstype = pkg.fstype.code();
        slot.crc = crc;
        slot.set_dev(&pkg.dev);

        log::info!(
            "if={} of={} seek={} size={} crc={:#010x}",
            file_path.display(),
            output_path.display(),
            offset,
            file_len,
            crc
        );
    }

    let mut header_bytes = header.to_bytes()?;
    bit_swap(&mut header_bytes)?;
    out.seek(SeekFrom::Start(0))?;
    out.write_all(&header_bytes)?;

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fstype::FsType;
    use std::fs;

    #[test]
    fn minimal_build_matches_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("pkg.cfg");
        let a_bin = dir.path().join("a.bin");
        fs::write(&a_bin, [1u8, 2, 3]).unwrap();
        fs::write(
            &manifest_path,
            "[header]\ntag=np1500\nver=0x00000001\n\n\
             [pkg]\nidx=1\ninclude=1\nfile=a.bin\nver=0x2\ndev=/dev/mtd0\nfstype=raw\n",
        )
        .unwrap();

        let output_path = dir.path().join("out.bin");
        let header = build(&manifest_path, &output_path).unwrap();

        assert_eq!(header.tag_str(), "np1500");
        assert_eq!(header.ver, 1);
        let slot = header.slot(1);
        assert_eq!(slot.size, 3);
        assert_eq!(slot.offset, HEADER_SIZE as u32);
        assert_eq!(slot.ver, 2);
        assert_eq!(slot.fstype(), FsType::Raw);
        assert_eq!(slot.dev_str(), "/dev/mtd0");

        let on_disk = fs::read(&output_path).unwrap();
        assert_eq!(on_disk.len(), HEADER_SIZE + 512);
        assert_eq!(&on_disk[HEADER_SIZE..HEADER_SIZE + 3], &[1, 2, 3]);
        assert!(on_disk[HEADER_SIZE + 3..].iter().all(|&b| b == 0));

        let expected_crc = crate::crc32::crc_np(0, &[1, 2, 3]);
        assert_eq!(slot.crc, expected_crc);
    }

    #[test]
    fn crc_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("pkg.cfg");
        fs::write(dir.path().join("a.bin"), [9u8]).unwrap();
        fs::write(
            &manifest_path,
            "[header]\ntag=np1500\nver=0x1\n\n\
             [pkg]\nidx=1\ninclude=1\nfile=a.bin\ncrc=0xCAFEBABE\n",
        )
        .unwrap();
        let output_path = dir.path().join("out.bin");
        let header = build(&manifest_path, &output_path).unwrap();
        assert_eq!(header.slot(1).crc, 0xCAFEBABE);
    }

    #[test]
    fn last_idx_wins_in_final_header() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("pkg.cfg");
        fs::write(dir.path().join("a.bin"), [1u8]).unwrap();
        fs::write(dir.path().join("b.bin"), [2u8, 2]).unwrap();
        fs::write(
            &manifest_path,
            "[header]\ntag=np1500\nver=0x1\n\n\
             [pkg]\nidx=1\ninclude=1\nfile=a.bin\n\n\
             [pkg]\nidx=1\ninclude=1\nfile=b.bin\n",
        )
        .unwrap();
        let output_path = dir.path().join("out.bin");
        let header = build(&manifest_path, &output_path).unwrap();
        assert_eq!(header.slot(1).size, 2);
    }
}
