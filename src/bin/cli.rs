//! blocklog CLI
//!
//! Append to, dump, and verify block log files.

use std::path::PathBuf;
use std::process::ExitCode;

use blocklog::config::DEFAULT_BLOCK_SIZE;
use blocklog::{Config, LogFile, RecordCorrupted};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// blocklog CLI
#[derive(Parser, Debug)]
#[command(name = "blocklog-cli")]
#[command(about = "Inspect and append to block-chunked log files")]
#[command(version)]
struct Args {
    /// Block size used when a new file is created
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Do not fsync after every written chunk
    #[arg(long)]
    no_force_flush: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append records to a log file
    Append {
        /// The log file
        file: PathBuf,

        /// Records to append, one per argument
        #[arg(required = true)]
        records: Vec<String>,
    },

    /// Print every record of a log file
    Dump {
        /// The log file
        file: PathBuf,
    },

    /// Count records and corrupted chunks
    Verify {
        /// The log file
        file: PathBuf,

        /// Stop at the first corrupted chunk
        #[arg(long)]
        stop_on_corruption: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blocklog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> blocklog::Result<()> {
    let config_for = |file: PathBuf| {
        Config::builder()
            .path(file)
            .block_size(args.block_size)
            .force_flush(!args.no_force_flush)
            .build()
    };

    match args.command {
        Commands::Append { file, records } => {
            let log_file = LogFile::new(config_for(file));
            for record in &records {
                let position = log_file.append(record.as_bytes())?;
                tracing::debug!("Appended {} bytes, file position {}", record.len(), position);
            }
            log_file.close()?;
            println!("appended {} records", records.len());
        }
        Commands::Dump { file } => {
            let log_file = LogFile::new(config_for(file));
            let mut index = 0u64;
            let end = log_file.load(|record: &[u8], position: u64| {
                println!("#{:<6} pos={:<10} len={:<8} {}", index, position, record.len(), render(record));
                index += 1;
                true
            })?;
            println!("{} records, stopped at {:?}", index, end);
        }
        Commands::Verify {
            file,
            stop_on_corruption,
        } => {
            let log_file = LogFile::new(config_for(file));
            let mut records = 0u64;
            let mut corrupted = 0u64;
            log_file.load_with(
                |_: &[u8], _: u64| {
                    records += 1;
                    true
                },
                |error: &RecordCorrupted| {
                    tracing::warn!("{}", error);
                    corrupted += 1;
                    !stop_on_corruption
                },
            )?;
            println!("records: {}, corrupted chunks: {}", records, corrupted);
        }
    }
    Ok(())
}

/// Printable rendering: text when the record is UTF-8, hex otherwise
fn render(record: &[u8]) -> String {
    const PREVIEW: usize = 64;
    let shown = &record[..record.len().min(PREVIEW)];
    let ellipsis = if record.len() > PREVIEW { "…" } else { "" };

    match std::str::from_utf8(shown) {
        Ok(text) if !text.chars().any(char::is_control) => format!("{:?}{}", text, ellipsis),
        _ => {
            let hex: String = shown.iter().map(|b| format!("{:02x}", b)).collect();
            format!("0x{}{}", hex, ellipsis)
        }
    }
}
