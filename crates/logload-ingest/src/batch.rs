//! Bounded batching of records into insert statements
//!
//! Batch boundaries are record-count only: one statement per `numrows`
//! records in line order, plus one final statement for any remainder. A chunk
//! that produced no records emits nothing.

use crate::error::Result;
use crate::parse::LogRecord;
use crate::sink::RecordSink;

/// Accumulates records and flushes a full batch the moment it reaches
/// `numrows`.
pub struct Batcher {
    numrows: usize,
    buf: Vec<LogRecord>,
}

impl Batcher {
    pub fn new(numrows: usize) -> Self {
        Self {
            numrows,
            buf: Vec::with_capacity(numrows),
        }
    }

    /// Buffer one record, flushing through the sink when the batch is full.
    pub async fn push(&mut self, sink: &mut dyn RecordSink, record: LogRecord) -> Result<()> {
        self.buf.push(record);
        if self.buf.len() == self.numrows {
            self.flush(sink).await?;
        }
        Ok(())
    }

    /// Flush the buffered remainder, if any.
    pub async fn finish(&mut self, sink: &mut dyn RecordSink) -> Result<()> {
        if !self.buf.is_empty() {
            self.flush(sink).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, sink: &mut dyn RecordSink) -> Result<()> {
        sink.write_batch(&self.buf).await?;
        self.buf.clear();
        Ok(())
    }
}
