//! The `info` binary: dumps a FAMILY-A header's tag and package slot table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use npfw::family_a::HeaderA;

#[derive(Debug, Parser)]
#[command(name = "info", about = "Dump a FAMILY-A header's tag and slot table")]
struct Cli {
    input: PathBuf,
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
    let header = HeaderA::read_from_file(&cli.input)?;
    println!("{}\t{:#010x}", header.tag_str(), header.ver);
    for (idx, slot) in header.slots() {
        if slot.is_empty() {
            continue;
        }
        println!(
            "{idx}\t{:#010x}\t{}\t{}\t{:#010x}\t{:#010x}\t{:#010x}",
            slot.ver,
            slot.dev_str(),
            slot.fstype().label(),
            slot.offset,
            slot.size,
            slot.crc
        );
    }
    Ok(())
}
