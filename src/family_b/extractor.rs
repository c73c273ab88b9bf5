//! ExtractorB: FAMILY-B image → free-text section report + extracted
//! sections/device payloads, with inflate.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use binrw::BinRead;
use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{Error, Result};
use crate::family_b::descriptors::{
    DeviceDescriptor, FIXED_SECTIONS, FPOS_COUNT, FULL_WORDS, MENU_WORDS, MODEL_BYTE_OFFSET,
    SETUP_OFFSET, Setup, SystemDescriptor, destination,
};
use crate::xorcodec::{PATTERN_B, single_byte_pattern, xor_pattern, xor_pattern_relaxed};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub extract_payloads: bool,
    pub verbose: bool,
}

fn align_up(n: u64, align: u64) -> u64 {
    n.div_ceil(align) * align
}

fn read_fully<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
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

/// A reader over a byte slice that remembers how many bytes were actually
/// pulled out of it, so a decompressor that stops early (trailing garbage
/// left in the slice) can be detected after the fact.
struct CountingReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Read for CountingReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = (&self.data[self.pos..]).read(buf)?;
        self.pos += n;
        Ok(n)
    }
}

fn inflate_chunk(data: &[u8], expected: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected as usize);
    let consumed = if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
        let mut decoder = GzDecoder::new(CountingReader { data, pos: 0 });
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::InflateError { detail: e.to_string() })?;
        decoder.get_ref().pos
    } else {
        let mut decoder = ZlibDecoder::new(CountingReader { data, pos: 0 });
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::InflateError { detail: e.to_string() })?;
        decoder.get_ref().pos
    };
    if out.len() != expected as usize {
        return Err(Error::InflateError {
            detail: format!("chunk inflated to {} bytes, expected {}", out.len(), expected),
        });
    }
    if consumed != data.len() {
        return Err(Error::InflateError {
            detail: format!("chunk consumed {} of {} compressed bytes", consumed, data.len()),
        });
    }
    Ok(out)
}

fn derive_filename(setup: &Setup, dev: &DeviceDescriptor) -> String {
    let dest = destination(dev.dest);
    let base = dest.rsplit('/').next().unwrap_or(&dest).to_string();
    let compressed = dev.compressed != 0;
    if !setup.is_full() && compressed {
        format!("{base}.gz")
    } else if !base.contains('.') {
        format!("{base}.bin")
    } else {
        base
    }
}

/// Reads the full FAMILY-B layout from `input_path`, writing recovered
/// sections/device payloads under `output_dir` when `opts.extract_payloads`
/// is set, and returns the free-text section report.
pub fn extract(input_path: &Path, output_dir: &Path, opts: ExtractOptions) -> Result<String> {
    let mut input = File::open(input_path)?;
    if opts.extract_payloads {
        fs::create_dir_all(output_dir)?;
    }

    let mut report = String::new();
    let _ = writeln!(report, "Fixed offset encrypted sections");

    for section in FIXED_SECTIONS.iter() {
        input
            .seek(SeekFrom::Start(section.offset))
            .map_err(|_| Error::NoSeek { offset: section.offset })?;
        let mut buf = vec![0u8; section.size as usize];
        let got = read_fully(&mut input, &mut buf)?;
        if (got as u64) < section.size {
            return Err(Error::Truncated {
                where_: section.name.to_string(),
                expected: section.size as usize,
                got,
            });
        }
        xor_pattern(&mut buf, &PATTERN_B)?;

        let _ = writeln!(
            report,
            "{} offset={:#07x} size={:#07x}",
            section.name, section.offset, section.size
        );
        log::info!("{} offset={:#x} size={:#x}", section.name, section.offset, section.size);

        if opts.extract_payloads {
            fs::write(output_dir.join(section.name), &buf)?;
        }
    }

    input
        .seek(SeekFrom::Start(SETUP_OFFSET))
        .map_err(|_| Error::NoSeek { offset: SETUP_OFFSET })?;
    let mut menu_buf = [0u8; MENU_WORDS * 4];
    let got = read_fully(&mut input, &mut menu_buf)?;
    if got < menu_buf.len() {
        return Err(Error::Truncated {
            where_: "setup".to_string(),
            expected: menu_buf.len(),
            got,
        });
    }

    let setup = if menu_buf[MODEL_BYTE_OFFSET] == b'n' {
        input
            .seek(SeekFrom::Start(SETUP_OFFSET))
            .map_err(|_| Error::NoSeek { offset: SETUP_OFFSET })?;
        let mut full_buf = [0u8; FULL_WORDS * 4];
        let got = read_fully(&mut input, &mut full_buf)?;
        if got < full_buf.len() {
            return Err(Error::Truncated {
                where_: "setup".to_string(),
                expected: full_buf.len(),
                got,
            });
        }
        Setup::from_full_bytes(&full_buf)
    } else {
        Setup::from_menu_bytes(&menu_buf)
    };

    match &setup {
        Setup::Menu {
            date,
            autorun,
            quiet,
            keeplogs,
            dumpnand,
        } => {
            let _ = writeln!(
                report,
                "setup variant=menu date={} autorun={autorun:#010x} quiet={quiet:#010x} keeplogs={keeplogs:#010x} dumpnand={dumpnand:#010x}",
                trim_nul(date)
            );
        }
        Setup::Full {
            version,
            date,
            model,
            hostname,
            autorun,
            keeplogs,
            dumpnand,
        } => {
            let _ = writeln!(
                report,
                "setup variant=full version={} date={} model={} hostname={} autorun={autorun:#010x} keeplogs={keeplogs:#010x} dumpnand={dumpnand:#010x}",
                trim_nul(version),
                trim_nul(date),
                trim_nul(model),
                trim_nul(hostname)
            );
        }
    }

    let ndev = u32::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
    let mut devices = Vec::with_capacity(ndev as usize);
    for _ in 0..ndev {
        devices.push(DeviceDescriptor::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?);
    }

    let nsys = u32::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
    for i in 0..nsys {
        let sys = SystemDescriptor::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
        let mut body = vec![0u8; sys.size as usize];
        let got = read_fully(&mut input, &mut body)?;
        if got < body.len() {
            return Err(Error::Truncated {
                where_: format!("sys{i}"),
                expected: body.len(),
                got,
            });
        }

        let suffix = if sys.compressed != 0 { "gz" } else { "bin" };
        let filename = format!("sys{i}.{suffix}");
        let _ = writeln!(
            report,
            "sys{i} index={} size={:#010x} rawsize={:#010x} compressed={:#010x} file={filename}",
            sys.index, sys.size, sys.rawsize, sys.compressed
        );

        if opts.extract_payloads {
            fs::write(output_dir.join(&filename), &body)?;
        }
    }

    let mut fpos = [0u32; FPOS_COUNT];
    for slot in fpos.iter_mut() {
        *slot = u32::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
    }

    for (i, dev) in devices.iter().enumerate() {
        let pos = fpos[i] as u64;
        let filename = derive_filename(&setup, dev);

        let _ = writeln!(
            report,
            "dev{i} type={:#010x} dest={:#010x} size={:#010x} rawsize={:#010x} compressed={:#010x} pattern={:#010x} cksum={:#010x} file={filename}",
            dev.r#type, dev.dest, dev.size, dev.rawsize, dev.compressed, dev.pattern, dev.cksum
        );
        log::info!("dev{i} fpos={pos:#x} file={filename}");

        if !opts.extract_payloads {
            continue;
        }

        input.seek(SeekFrom::Start(pos)).map_err(|_| Error::NoSeek { offset: pos })?;

        let payload = if setup.is_full() && dev.compressed != 0 {
            let mut out = Vec::new();
            loop {
                let usize_ = u32::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
                let zsize = u32::read_le(&mut input).map_err(|e| Error::Codec { detail: e.to_string() })?;
                if usize_ == 0 {
                    break;
                }
                let padded = align_up(zsize as u64, 8) as usize;
                let mut chunk = vec![0u8; padded];
                let got = read_fully(&mut input, &mut chunk)?;
                if got < padded {
                    return Err(Error::Truncated {
                        where_: format!("dev{i} chunk"),
                        expected: padded,
                        got,
                    });
                }
                xor_pattern(&mut chunk, &PATTERN_B)?;
                let inflated = inflate_chunk(&chunk[..zsize as usize], usize_)?;
                out.extend_from_slice(&inflated);
            }
            out
        } else {
            let mut buf = vec![0u8; dev.size as usize];
            let got = read_fully(&mut input, &mut buf)?;
            if got < buf.len() {
                return Err(Error::Truncated {
                    where_: format!("dev{i}"),
                    expected: buf.len(),
                    got,
                });
            }
            xor_pattern_relaxed(&mut buf, &single_byte_pattern(dev.pattern));
            buf
        };

        fs::write(output_dir.join(&filename), &payload)?;
    }

    Ok(report)
}

fn trim_nul(bytes: &[u8]) -> &str {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..len]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_image_menu() -> Vec<u8> {
        // Fixed sections hold Pattern-B repeated; descrambling XORs it away to zero.
        let mut img = vec![0u8; 0x30000];
        for (i, b) in img.iter_mut().enumerate() {
            *b = PATTERN_B[i % PATTERN_B.len()];
        }

        // setup: menu variant, 18 words of zero (model byte stays 0, not 'n')
        img.extend(vec![0u8; MENU_WORDS * 4]);
        // ndev = 0
        img.extend(0u32.to_le_bytes());
        // nsys = 0
        img.extend(0u32.to_le_bytes());
        // fpos table (10 entries), unused when ndev == 0
        for _ in 0..FPOS_COUNT {
            img.extend(0u32.to_le_bytes());
        }
        img
    }

    #[test]
    fn descrambles_fixed_sections_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("image.bin");
        let mut f = File::create(&image_path).unwrap();
        f.write_all(&minimal_image_menu()).unwrap();
        drop(f);

        let out_dir = dir.path().join("extracted");
        let report = extract(
            &image_path,
            &out_dir,
            ExtractOptions {
                extract_payloads: true,
                verbose: false,
            },
        )
        .unwrap();

        assert!(report.contains("ploader offset=0x00000 size=0x08000"));
        let ploader = fs::read(out_dir.join("ploader")).unwrap();
        assert_eq!(ploader.len(), 0x08000);
        assert!(ploader.iter().all(|&b| b == 0));
    }

    #[test]
    fn menu_variant_is_selected_when_model_byte_is_not_n() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("image.bin");
        let mut f = File::create(&image_path).unwrap();
        f.write_all(&minimal_image_menu()).unwrap();
        drop(f);

        let out_dir = dir.path().join("extracted");
        let report = extract(&image_path, &out_dir, ExtractOptions::default()).unwrap();
        assert!(report.contains("variant=menu"));
    }

    #[test]
    fn destination_filenames_get_bin_suffix_when_dotless() {
        let setup = Setup::Menu {
            date: [0; 32],
            autorun: 0,
            quiet: 0,
            keeplogs: 0,
            dumpnand: 0,
        };
        let dev = DeviceDescriptor {
            r#type: 0,
            dest: 0,
            size: 0,
            rawsize: 0,
            compressed: 0,
            pattern: 0,
            cksum: 0,
        };
        assert_eq!(derive_filename(&setup, &dev), "_nand0.bin");

        let dev_sysdata = DeviceDescriptor { dest: 8, ..dev };
        assert_eq!(derive_filename(&setup, &dev_sysdata), "sysdata.img");
    }

    #[test]
    fn menu_compressed_device_gets_gz_suffix() {
        let setup = Setup::Menu {
            date: [0; 32],
            autorun: 0,
            quiet: 0,
            keeplogs: 0,
            dumpnand: 0,
        };
        let dev = DeviceDescriptor {
            r#type: 0,
            dest: 0,
            size: 0,
            rawsize: 0,
            compressed: 1,
            pattern: 0,
            cksum: 0,
        };
        assert_eq!(derive_filename(&setup, &dev), "_nand0.gz");
    }
}
