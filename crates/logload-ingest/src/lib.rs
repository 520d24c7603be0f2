//! Logload Ingest Library
//!
//! Chunked parallel loading of web-server access logs into a MySQL-family
//! `log` table.
//!
//! The pipeline splits the input file into bounded chunk files on scoped
//! temporary storage, dispatches one worker task per chunk across a
//! fixed-size pool, parses and normalizes every line, and flushes bounded
//! multi-row inserts over a dedicated connection per worker. Failures are
//! contained to their chunk and surfaced in the run summary.
//!
//! # Example
//!
//! ```no_run
//! use logload_ingest::config::DbConfig;
//! use logload_ingest::pipeline::{self, IngestOptions};
//! use logload_ingest::pool::MalformedLinePolicy;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = DbConfig::from_env()?;
//!     let summary = pipeline::run(db, IngestOptions {
//!         file: "access.log".into(),
//!         numprocs: 8,
//!         numrows: 100,
//!         chunksize: 20_000,
//!         malformed: MalformedLinePolicy::Fail,
//!     })
//!     .await?;
//!     println!("loaded {} records", summary.records_loaded);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod chunk;
pub mod config;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod sink;

// Re-export commonly used types
pub use error::{IngestError, Result};
