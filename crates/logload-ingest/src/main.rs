//! logload - parallel access-log loader

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use logload_common::logging::{init_logging, LogConfig, LogLevel};
use logload_ingest::config::DbConfig;
use logload_ingest::pipeline::{self, IngestOptions};
use logload_ingest::pool::MalformedLinePolicy;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "logload")]
#[command(author, version, about = "Bulk-load an access log into the database")]
struct Cli {
    /// Path to the source log file
    #[arg(short, long)]
    file: PathBuf,

    /// Worker pool size
    #[arg(short = 'p', long, default_value_t = default_numprocs())]
    numprocs: usize,

    /// Records per INSERT statement
    #[arg(short = 'r', long, default_value_t = 100)]
    numrows: usize,

    /// Lines per chunk file
    #[arg(short = 's', long, default_value_t = 20_000)]
    chunksize: usize,

    /// Log and skip malformed lines instead of failing their chunk
    #[arg(long)]
    skip_malformed: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Default worker pool size: twice the available cores.
fn default_numprocs() -> usize {
    2 * std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment configuration first, then the verbose flag on top
    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    init_logging(&log_config)?;

    let db = DbConfig::from_env()?;

    let opts = IngestOptions {
        file: cli.file,
        numprocs: cli.numprocs,
        numrows: cli.numrows,
        chunksize: cli.chunksize,
        malformed: if cli.skip_malformed {
            MalformedLinePolicy::Skip
        } else {
            MalformedLinePolicy::Fail
        },
    };

    info!(
        file = %opts.file.display(),
        numprocs = opts.numprocs,
        numrows = opts.numrows,
        chunksize = opts.chunksize,
        "Starting load"
    );

    let summary = pipeline::run(db, opts).await?;

    if summary.chunks_failed > 0 {
        anyhow::bail!(
            "{} of {} chunks failed to load; see the log for per-chunk causes",
            summary.chunks_failed,
            summary.chunks_failed + summary.chunks_loaded
        );
    }

    info!(records = summary.records_loaded, "Load complete");
    Ok(())
}
