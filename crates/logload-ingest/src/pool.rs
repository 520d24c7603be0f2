//! Worker pool coordination across chunk files
//!
//! One load task per chunk, a fixed number of them running at once. Each
//! worker owns its sink (one dedicated connection) for the task's lifetime
//! and releases it on every exit path. Failures are caught at the task
//! boundary, reported, and tallied — a bad chunk never takes its siblings
//! down, and the coordinator still learns about it through the summary.

use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::batch::Batcher;
use crate::chunk::Chunk;
use crate::error::{IngestError, Result};
use crate::parse::LineParser;
use crate::report;
use crate::sink::{RecordSink, SinkFactory};

/// What to do with a line that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Abort the chunk on the first malformed line. Batches flushed before
    /// the bad line stay committed; later lines are never read.
    #[default]
    Fail,
    /// Log the malformed line and continue with the rest of the chunk.
    Skip,
}

/// Per-run worker pool settings.
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    /// Number of workers running concurrently
    pub numprocs: usize,
    /// Records per insert statement
    pub numrows: usize,
    pub malformed: MalformedLinePolicy,
}

/// Terminal state of one chunk's load.
#[derive(Debug)]
pub enum ChunkOutcome {
    Loaded { chunk_id: u32, records: u64 },
    Failed { chunk_id: u32, error: IngestError },
}

/// Aggregated result of a pool run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolSummary {
    pub chunks_loaded: usize,
    pub chunks_failed: usize,
    pub records_loaded: u64,
}

/// Dispatch one load task per chunk across a pool of `numprocs` workers and
/// wait for every task to finish.
///
/// Chunks may complete and insert in any order relative to each other; only
/// the within-chunk order is guaranteed.
pub async fn run_pool(
    factory: Arc<dyn SinkFactory>,
    chunks: Vec<Chunk>,
    opts: PoolOptions,
) -> PoolSummary {
    let semaphore = Arc::new(Semaphore::new(opts.numprocs));
    let mut handles = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let factory = Arc::clone(&factory);
        let semaphore = Arc::clone(&semaphore);

        handles.push(tokio::spawn(async move {
            // The semaphore lives for the whole run and is never closed.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("pool semaphore closed");
            load_chunk(factory.as_ref(), &chunk, opts).await
        }));
    }

    let mut summary = PoolSummary::default();
    for handle in handles {
        match handle.await {
            Ok(ChunkOutcome::Loaded { chunk_id, records }) => {
                summary.chunks_loaded += 1;
                summary.records_loaded += records;
                debug!(chunk_id, records, "Chunk loaded");
            },
            Ok(ChunkOutcome::Failed { chunk_id, .. }) => {
                // Already reported at the task boundary.
                summary.chunks_failed += 1;
                debug!(chunk_id, "Chunk failed");
            },
            Err(e) => {
                summary.chunks_failed += 1;
                error!(error = %e, "Chunk worker panicked");
            },
        }
    }

    summary
}

/// Load one chunk through its own dedicated sink.
///
/// Every failure is caught here, reported, and converted into an outcome so
/// sibling workers keep running. The sink is released on all exit paths.
pub async fn load_chunk(
    factory: &dyn SinkFactory,
    chunk: &Chunk,
    opts: PoolOptions,
) -> ChunkOutcome {
    let mut sink = match factory.connect().await {
        Ok(sink) => sink,
        Err(error) => {
            report::chunk_failure(chunk.id, &error);
            return ChunkOutcome::Failed { chunk_id: chunk.id, error };
        },
    };

    match process_chunk(sink.as_mut(), chunk, opts).await {
        Ok(records) => {
            if let Err(error) = sink.close().await {
                warn!(chunk_id = chunk.id, error = %error, "Sink did not close cleanly");
            }
            ChunkOutcome::Loaded { chunk_id: chunk.id, records }
        },
        Err(error) => {
            if let Err(e) = sink.close().await {
                debug!(chunk_id = chunk.id, error = %e, "Sink close failed after chunk error");
            }
            report::chunk_failure(chunk.id, &error);
            ChunkOutcome::Failed { chunk_id: chunk.id, error }
        },
    }
}

/// Stream one chunk file through the parser and batcher.
async fn process_chunk(
    sink: &mut dyn RecordSink,
    chunk: &Chunk,
    opts: PoolOptions,
) -> Result<u64> {
    let file = tokio::fs::File::open(&chunk.path).await?;
    let mut lines = tokio::io::BufReader::new(file).lines();

    let parser = LineParser::new();
    let mut batcher = Batcher::new(opts.numrows);
    let mut records = 0u64;
    let mut lineno = 0u64;

    while let Some(line) = lines.next_line().await? {
        lineno += 1;
        let record = match parser.parse(&line) {
            Ok(record) => record,
            Err(error) => match opts.malformed {
                MalformedLinePolicy::Fail => return Err(error),
                MalformedLinePolicy::Skip => {
                    warn!(chunk_id = chunk.id, line_number = lineno, line = %line, "Skipping malformed line");
                    continue;
                },
            },
        };

        batcher.push(sink, record).await?;
        records += 1;
    }

    batcher.finish(sink).await?;
    Ok(records)
}
