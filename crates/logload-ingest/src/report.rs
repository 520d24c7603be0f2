//! Structured reporting of per-chunk failures

use tracing::error;

use crate::error::IngestError;

/// Record one chunk's terminal failure at error severity.
///
/// The pipeline never retries; this entry plus the run summary are the
/// operator's whole view of the failure. Parse failures carry the offending
/// line, everything else the underlying cause.
pub fn chunk_failure(chunk_id: u32, err: &IngestError) {
    match err {
        IngestError::Parse { line } => {
            error!(chunk_id, line = %line, "Chunk aborted on malformed line");
        },
        other => {
            error!(chunk_id, error = %other, "Chunk failed to load");
        },
    }
}
