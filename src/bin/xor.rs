//! The `xor` binary: a general-purpose Pattern-B descrambler for ad-hoc
//! analysis, independent of either image format's framing.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use npfw::xorcodec::{PATTERN_B, xor_pattern_relaxed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pattern {
    Np890,
}

#[derive(Debug, Parser)]
#[command(name = "xor", about = "XOR a byte range of a file against Pattern-B")]
struct Cli {
    #[arg(long, value_enum)]
    pattern: Pattern,

    /// Byte offset to start reading from (accepts 0x… hex).
    #[arg(long, default_value = "0", value_parser = parse_uint)]
    offset: u64,

    /// Number of bytes to process; 0 means "to EOF" (accepts 0x… hex).
    #[arg(long, default_value = "0", value_parser = parse_uint)]
    size: u64,

    input: PathBuf,
    output: PathBuf,
}

fn parse_uint(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Pattern::Np890 = cli.pattern;

    let mut input = File::open(&cli.input)?;
    input.seek(SeekFrom::Start(cli.offset))?;

    let mut buf = if cli.size == 0 {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        buf
    } else {
        let mut buf = vec![0u8; cli.size as usize];
        input.read_exact(&mut buf)?;
        buf
    };

    xor_pattern_relaxed(&mut buf, &PATTERN_B);

    let mut output = File::create(&cli.output)?;
    output.write_all(&buf)?;
    Ok(())
}
