//! Logload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared ambient concerns for the logload workspace.
//!
//! Currently this is the logging layer: every logload binary initializes
//! `tracing` through [`logging::init_logging`] so that log level, format and
//! filter directives are configured the same way everywhere.
//!
//! # Example
//!
//! ```no_run
//! use logload_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod logging;
