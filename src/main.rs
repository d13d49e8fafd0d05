use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mfdach_import::import::source_file_name;
use mfdach_import::{
    CatalogStore, DecodedFile, DecoderRegistry, FileStatus, ImportConfig, ImportReport, Importer,
    DEFAULT_BATCH_SIZE, read_cp437,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mfdach-import")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Import the MFDach Leistungsverzeichnis (.lst/.pos) into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import all .lst and .pos files from a directory
    Import {
        /// Directory with the MFDach catalog files
        #[arg(short, long, value_name = "DIR", default_value = "Posten")]
        source: PathBuf,

        /// SQLite database to write to
        #[arg(long, env = "MFDACH_DB", default_value = "mfdach.sqlite", value_name = "FILE")]
        db: String,

        /// Delete previously imported rows first
        #[arg(long)]
        clean: bool,

        /// Positions written per transaction
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "N")]
        batch_size: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a single .lst or .pos file and print its records as JSON
    Decode {
        /// Catalog file to decode
        file: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show row counts of an imported catalog
    Stats {
        /// SQLite database to read
        #[arg(long, env = "MFDACH_DB", default_value = "mfdach.sqlite", value_name = "FILE")]
        db: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import {
            source,
            db,
            clean,
            batch_size,
            json,
        } => run_import(source, &db, clean, batch_size, json),
        Commands::Decode { file, pretty } => run_decode(file, pretty),
        Commands::Stats { db } => run_stats(&db),
    }
}

fn run_import(source: PathBuf, db: &str, clean: bool, batch_size: usize, json: bool) -> Result<()> {
    let start = Instant::now();
    let mut store = CatalogStore::open(db)?;
    let config = ImportConfig::new(source).batch_size(batch_size).clean(clean);
    let report = Importer::new(config)
        .run(&mut store)
        .context("Catalog import failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        println!("Finished in {:.2}s", start.elapsed().as_secs_f64());
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    for file in &report.files {
        let marker = match file.status {
            FileStatus::Imported => "✓",
            FileStatus::Empty => "⚠",
            FileStatus::Failed => "✗",
        };
        println!(
            "  {} {} [{}]: {} written, {} skipped",
            marker,
            file.source_file,
            file.kind.as_str(),
            file.written,
            file.skipped
        );
        for error in &file.errors {
            println!("      {}", error);
        }
    }
    println!("─────────────────────────────────");
    println!("Categories:           {}", report.categories_written());
    println!("Positions:            {}", report.positions_written());
    println!("Failed files:         {}", report.failed_files());
}

fn run_decode(file: PathBuf, pretty: bool) -> Result<()> {
    let registry = DecoderRegistry::new();
    let name = source_file_name(&file);
    let Some(decoder) = registry.select(&name) else {
        bail!(
            "Unsupported file type: {} (expected one of: {})",
            name,
            registry.registered_extensions().join(", ")
        );
    };

    let text = read_cp437(&file)?;
    let decoded = decoder.decode(&name, &text);
    let output = match (&decoded, pretty) {
        (DecodedFile::Categories(records), true) => serde_json::to_string_pretty(records)?,
        (DecodedFile::Categories(records), false) => serde_json::to_string(records)?,
        (DecodedFile::Positions(records), true) => serde_json::to_string_pretty(records)?,
        (DecodedFile::Positions(records), false) => serde_json::to_string(records)?,
    };
    println!("{}", output);
    eprintln!("{} records decoded from {}", decoded.len(), name);
    Ok(())
}

fn run_stats(db: &str) -> Result<()> {
    let store = CatalogStore::open(db)?;
    let stats = store.stats()?;

    println!("Categories:           {}", stats.category_count);
    println!("Positions:            {}", stats.position_count);
    if !stats.positions_by_file.is_empty() {
        println!("\nBy file:");
        for entry in &stats.positions_by_file {
            println!("  {}: {}", entry.source_file, entry.positions);
        }
    }
    Ok(())
}
