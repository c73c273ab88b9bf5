//! Canonical hex+ASCII dump used by the `--verbose` debug trace in
//! ExtractorA/ExtractorB, collapsing repeated all-zero lines the way
//! `fputdata` in the original tooling did on long zero runs.

use std::fmt::Write as _;

/// Renders `data` 16 bytes per line as `<offset>  <hex bytes>  |<ascii>|`,
/// collapsing consecutive all-zero lines after the first into a single `*`.
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::new();
    let mut last: Option<&[u8]> = None;
    let mut collapsed = false;

    for (i, chunk) in data.chunks(16).enumerate() {
        let offset = i * 16;
        let is_zero = chunk.iter().all(|&b| b == 0);
        if is_zero && last.map(|l| l == chunk).unwrap_or(false) {
            if !collapsed {
                let _ = writeln!(out, "*");
                collapsed = true;
            }
            continue;
        }
        collapsed = false;
        last = Some(chunk);

        let _ = write!(out, "{offset:08x}  ");
        for (j, b) in chunk.iter().enumerate() {
            let _ = write!(out, "{b:02x} ");
            if j == 7 {
                let _ = write!(out, " ");
            }
        }
        for _ in chunk.len()..16 {
            let _ = write!(out, "   ");
        }
        let _ = write!(out, " |");
        for &b in chunk {
            let c = if (0x20..0x7f).contains(&b) { b as char } else { '.' };
            let _ = write!(out, "{c}");
        }
        let _ = writeln!(out, "|");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_is_ascii_annotated() {
        let out = hexdump(b"hello");
        assert!(out.contains("|hello|"));
    }

    #[test]
    fn repeated_zero_lines_collapse() {
        let data = vec![0u8; 16 * 4];
        let out = hexdump(&data);
        assert_eq!(out.matches('*').count(), 1);
    }

    #[test]
    fn distinct_lines_are_not_collapsed() {
        let mut data = vec![0u8; 32];
        data[20] = 1;
        let out = hexdump(&data);
        assert_eq!(out.matches('*').count(), 0);
    }
}
