//! End-to-end ingestion runs
//!
//! Split, load in parallel, clean up, summarize. Chunk files live under a
//! scoped temporary directory owned by this invocation; it is removed once
//! every worker has finished, whether or not any chunk failed.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::chunk;
use crate::config::DbConfig;
use crate::error::{IngestError, Result};
use crate::pool::{self, MalformedLinePolicy, PoolOptions, PoolSummary};
use crate::sink::{MySqlSinkFactory, SinkFactory};

/// Settings for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Path to the source log file
    pub file: PathBuf,
    /// Worker pool size
    pub numprocs: usize,
    /// Records per insert statement
    pub numrows: usize,
    /// Lines per chunk file
    pub chunksize: usize,
    pub malformed: MalformedLinePolicy,
}

impl IngestOptions {
    /// Validate the bounds the splitter and batcher rely on.
    pub fn validate(&self) -> Result<()> {
        if self.numprocs == 0 {
            return Err(IngestError::config("numprocs must be at least 1"));
        }
        if self.numrows == 0 {
            return Err(IngestError::config("numrows must be at least 1"));
        }
        if self.chunksize == 0 {
            return Err(IngestError::config("chunksize must be at least 1"));
        }
        Ok(())
    }
}

/// Run the full pipeline against the configured database.
pub async fn run(db: DbConfig, opts: IngestOptions) -> Result<PoolSummary> {
    run_with_factory(Arc::new(MySqlSinkFactory::new(db)), opts).await
}

/// Run the full pipeline against any sink factory.
pub async fn run_with_factory(
    factory: Arc<dyn SinkFactory>,
    opts: IngestOptions,
) -> Result<PoolSummary> {
    opts.validate()?;

    let tmpdir = tempfile::tempdir()?;
    let chunks = chunk::split_into_chunks(tmpdir.path(), &opts.file, opts.chunksize).await?;
    info!(
        chunks = chunks.len(),
        chunksize = opts.chunksize,
        file = %opts.file.display(),
        "Split input into chunks"
    );

    let summary = pool::run_pool(
        factory,
        chunks,
        PoolOptions {
            numprocs: opts.numprocs,
            numrows: opts.numrows,
            malformed: opts.malformed,
        },
    )
    .await;

    info!(
        chunks_loaded = summary.chunks_loaded,
        chunks_failed = summary.chunks_failed,
        records_loaded = summary.records_loaded,
        "Ingestion finished"
    );

    // All workers are done; drop the chunk files with the directory.
    tmpdir.close()?;

    Ok(summary)
}
