//! designfile-info - inventory Revit design files below a directory
//!
//! Writes a CSV ledger with one row per model, plus `<csv>_Errors.txt` for
//! files that could not be read.
use anyhow::{Context, Result};
use clap::Parser;
use designfile_info::container::DEFAULT_MAX_STREAM_SIZE;
use designfile_info::config::DEFAULT_MAX_PATH_LEN;
use designfile_info::{CsvLedger, FailureKind, Inventory, InventoryConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "designfile-info")]
#[command(about = "Inventory Revit design files and their BasicFileInfo metadata")]
#[command(version)]
struct Cli {
    /// Directory to walk
    root: PathBuf,

    /// CSV ledger to create (overwritten if it exists)
    csv: PathBuf,

    /// Design file extension to read (repeatable)
    #[arg(long = "extension", value_name = "EXT", default_value = "rvt")]
    extensions: Vec<String>,

    /// Longest path, in characters, that is visited
    #[arg(long, default_value_t = DEFAULT_MAX_PATH_LEN)]
    max_path_len: usize,

    /// Largest BasicFileInfo stream read, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_STREAM_SIZE)]
    max_stream_size: u64,

    /// Also list AutoCAD drawings in <csv>_AutoCADFiles.csv
    #[arg(long)]
    include_drawings: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = InventoryConfig::new(&cli.root)
        .with_design_extensions(&cli.extensions)
        .with_drawings(cli.include_drawings)
        .with_max_path_len(cli.max_path_len)
        .with_max_stream_size(cli.max_stream_size);

    let mut ledger = CsvLedger::create(&cli.csv, false)
        .with_context(|| format!("Failed to create ledger {}", cli.csv.display()))?;

    let summary = Inventory::new(config)
        .run(&mut ledger)
        .with_context(|| format!("Failed to write error log {}", ledger.errors_path().display()))?;

    println!(
        "{} design files written to {}",
        summary.records_written,
        cli.csv.display()
    );
    if cli.include_drawings {
        println!(
            "{} drawings written to {}",
            summary.drawings_written,
            ledger.drawings_path().display()
        );
    }

    let logged = summary.skipped.len() - summary.skipped_count(FailureKind::NotAContainer);
    if logged > 0 {
        println!(
            "{} entries skipped, see {}",
            logged,
            ledger.errors_path().display()
        );
    }
    Ok(())
}
