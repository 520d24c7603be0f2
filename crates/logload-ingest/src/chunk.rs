//! Splitting the input file into bounded chunk files
//!
//! The splitter streams the input once and materializes it as an ordered set
//! of chunk files on scoped temporary storage. Each chunk is the unit of work
//! handed to one pool worker.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use crate::error::Result;

/// One bounded, ordered slice of the input, materialized as its own file.
///
/// Owned by the splitter until handed to a worker task; discarded with the
/// temporary directory once the run finishes.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based id, monotonic in input order
    pub id: u32,
    pub path: PathBuf,
}

fn chunk_path(dir: &Path, id: u32) -> PathBuf {
    dir.join(format!("chunk{id}.log"))
}

/// Split `input` into files of at most `chunksize` lines under `dir`,
/// returned in chunk-id order.
///
/// The boundary triggers strictly after `chunksize` lines have been written
/// to the current chunk, and a new chunk file is opened only once a line
/// exists to fill it — an input whose line count is an exact multiple of
/// `chunksize` never leaves a trailing empty chunk. Concatenating the
/// returned files in id order reproduces the input line for line.
pub async fn split_into_chunks(dir: &Path, input: &Path, chunksize: usize) -> Result<Vec<Chunk>> {
    let file = File::open(input).await?;
    let mut lines = BufReader::new(file).lines();

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut writer: Option<BufWriter<File>> = None;
    let mut written = 0usize;

    while let Some(line) = lines.next_line().await? {
        let out = match writer.as_mut() {
            Some(out) => out,
            None => {
                let id = chunks.len() as u32 + 1;
                let path = chunk_path(dir, id);
                let file = File::create(&path).await?;
                chunks.push(Chunk { id, path });
                written = 0;
                writer.insert(BufWriter::new(file))
            },
        };

        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        written += 1;

        if written == chunksize {
            if let Some(mut out) = writer.take() {
                out.flush().await?;
            }
        }
    }

    if let Some(mut out) = writer.take() {
        out.flush().await?;
    }

    debug!(
        chunks = chunks.len(),
        chunksize,
        input = %input.display(),
        "Split input into chunk files"
    );

    Ok(chunks)
}
