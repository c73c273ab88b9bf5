//! ExtractorA: FAMILY-A image → manifest text + recovered package files.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::bitcodec::bit_swap;
use crate::crc32::crc_for_fstype;
use crate::error::{Error, Result};
use crate::family_a::header::{HEADER_SIZE, HeaderA};
use crate::hexdump::hexdump;
use crate::manifest::{self, HeaderFields};

/// Controls whether package payloads are written out alongside the
/// recovered manifest, and whether a raw hex trace of the header is logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub extract_payloads: bool,
    pub verbose: bool,
}

/// Reads the header (descrambling it) and every included slot's metadata,
/// emitting the manifest text ExtractorA produces. When
/// `opts.extract_payloads` is set, each slot's payload is also written to
/// `output_dir/segment<NN>.bin` and checked against its recorded CRC; a
/// mismatch is returned as `Error::CrcMismatch` only after that file has
/// already been written to disk.
pub fn extract(input_path: &Path, output_dir: &Path, opts: ExtractOptions) -> Result<String> {
    let mut input = File::open(input_path)?;

    let mut header_bytes = [0u8; HEADER_SIZE];
    let got = read_fully(&mut input, &mut header_bytes)?;
    if got < HEADER_SIZE {
        return Err(Error::Truncated {
            where_: "header".to_string(),
            expected: HEADER_SIZE,
            got,
        });
    }
    bit_swap(&mut header_bytes)?;

    if opts.verbose {
        log::debug!("descrambled header:\n{}", hexdump(&header_bytes));
    }

    let header = HeaderA::from_bytes(&header_bytes)?;
    let tag = header.tag_str().to_string();

    let mut out = String::new();
    manifest::write_header(
        &mut out,
        &HeaderFields {
            tag: tag.clone(),
            ver: header.ver,
        },
    );

    let mut pending_mismatch: Option<Error> = None;

    if opts.extract_payloads {
        fs::create_dir_all(output_dir)?;
    }

    for (idx, slot) in header.slots() {
        if slot.is_empty() {
            continue;
        }

        manifest::write_pkg(
            &mut out,
            idx,
            slot.ver,
            slot.dev_str(),
            slot.fstype(),
            slot.crc,
        );

        if opts.extract_payloads {
            input.seek(SeekFrom::Start(slot.offset as u64)).map_err(|_| Error::NoSeek {
                offset: slot.offset as u64,
            })?;
            let mut payload = vec![0u8; slot.size as usize];
            let n = read_fully(&mut input, &mut payload)?;
            if n < payload.len() {
                return Err(Error::Truncated {
                    where_: format!("segment{idx:02}.bin"),
                    expected: payload.len(),
                    got: n,
                });
            }

            let file_path = output_dir.join(format!("segment{idx:02}.bin"));
            fs::write(&file_path, &payload)?;

            if opts.verbose {
                log::debug!("segment{idx:02}.bin:\n{}", hexdump(&payload));
            }

            let mut cursor = Cursor::new(&payload);
            let computed = crc_for_fstype(&mut cursor, payload.len() as u64, slot.fstype(), &tag)?;
            if computed != slot.crc && pending_mismatch.is_none() {
                pending_mismatch = Some(Error::CrcMismatch {
                    expected: slot.crc,
                    got: computed,
                });
            }
        }
    }

    if let Some(err) = pending_mismatch {
        return Err(err);
    }

    Ok(out)
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
