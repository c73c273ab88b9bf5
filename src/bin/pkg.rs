//! The `pkg` binary: packer/inspector for both image families.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Family {
    Np1000,
    Np890,
}

#[derive(Debug, Parser)]
#[command(
    name = "pkg",
    about = "Pack, inspect and extract NP1000/NP890-style firmware update images",
    group(ArgGroup::new("action").args(["create", "extract", "info"]).required(false))
)]
struct Cli {
    /// Which on-disk image family to operate on.
    #[arg(long = "type", value_enum, default_value_t = Family::Np1000)]
    family: Family,

    /// Build a FAMILY-A image from a manifest (only valid with --type=np1000).
    #[arg(long)]
    create: bool,

    /// Extract the manifest and all package/section payloads.
    #[arg(long)]
    extract: bool,

    /// Write the manifest only, without extracting payloads.
    #[arg(long)]
    info: bool,

    /// Log a hex+ASCII trace of descrambled headers/sections.
    #[arg(long)]
    verbose: bool,

    input: PathBuf,
    output: PathBuf,
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
    if cli.create && cli.family != Family::Np1000 {
        bail!("--create is only valid with --type=np1000");
    }

    match cli.family {
        Family::Np1000 => run_np1000(&cli),
        Family::Np890 => run_np890(&cli),
    }
}

fn run_np1000(cli: &Cli) -> Result<()> {
    if cli.create {
        npfw::family_a::build(&cli.input, &cli.output)?;
        return Ok(());
    }

    let manifest_dir = manifest_dir_of(&cli.output);
    let opts = npfw::family_a::ExtractOptions {
        extract_payloads: cli.extract,
        verbose: cli.verbose,
    };
    let manifest_text = npfw::family_a::extract(&cli.input, &manifest_dir, opts)?;
    fs::write(&cli.output, manifest_text)?;
    Ok(())
}

fn run_np890(cli: &Cli) -> Result<()> {
    let manifest_dir = manifest_dir_of(&cli.output);
    let opts = npfw::family_b::ExtractOptions {
        extract_payloads: cli.extract,
        verbose: cli.verbose,
    };
    let report = npfw::family_b::extract(&cli.input, &manifest_dir, opts)?;
    fs::write(&cli.output, report)?;
    Ok(())
}

fn manifest_dir_of(output: &Path) -> PathBuf {
    output.parent().map(Path::to_path_buf).filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| PathBuf::from("."))
}
