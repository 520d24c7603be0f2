//! Destination sinks for normalized records
//!
//! A sink is where one worker's batches land. The MySQL implementation owns a
//! dedicated connection in autocommit mode; every batch is one multi-row
//! insert statement that commits on its own, so a chunk that fails mid-stream
//! keeps its earlier batches.

use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::debug;

use crate::config::DbConfig;
use crate::error::{IngestError, Result};
use crate::parse::LogRecord;

/// Destination table for loaded records. Assumed to exist with columns
/// `(ip, dt, url)`.
pub const TABLE: &str = "log";

/// Destination for one chunk's batches.
///
/// An implementation is owned by a single worker task for its lifetime and is
/// never shared across concurrent workers.
#[async_trait]
pub trait RecordSink: Send {
    /// Write one batch as a single insert statement.
    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<()>;

    /// Release the underlying connection. Called on every task exit path,
    /// success or failure.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens one dedicated sink per worker task.
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RecordSink>>;
}

/// Render one multi-row insert with values embedded as string literals.
///
/// `url` is escaped by the parser; `ip` and `dt` render from validated,
/// quote-free forms. The statement goes over the text protocol rather than
/// prepared-statement parameter binding.
pub fn render_insert(records: &[LogRecord]) -> String {
    let mut sql = format!("INSERT INTO `{TABLE}` (ip, dt, url) VALUES ");
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        let dt = record.timestamp.format("%Y-%m-%d %H:%M:%S");
        sql.push_str(&format!("('{}', '{}', '{}')", record.ip, dt, record.url));
    }
    sql
}

/// Sink backed by a dedicated MySQL connection in autocommit mode.
pub struct MySqlSink {
    conn: MySqlConnection,
}

#[async_trait]
impl RecordSink for MySqlSink {
    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let sql = render_insert(records);
        sqlx::raw_sql(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(IngestError::Insert)?;

        debug!(rows = records.len(), "Inserted batch");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().await.map_err(IngestError::Connection)
    }
}

/// Connects one [`MySqlSink`] per worker from shared configuration.
pub struct MySqlSinkFactory {
    config: DbConfig,
}

impl MySqlSinkFactory {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SinkFactory for MySqlSinkFactory {
    async fn connect(&self) -> Result<Box<dyn RecordSink>> {
        let conn = MySqlConnection::connect_with(&self.config.connect_options())
            .await
            .map_err(IngestError::Connection)?;
        Ok(Box::new(MySqlSink { conn }))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sinks for exercising the pipeline without a database.

    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every batch it receives into shared storage.
    pub(crate) struct MemorySink {
        pub batches: Arc<Mutex<Vec<Vec<LogRecord>>>>,
        /// Fail the Nth `write_batch` call (0-based) when set.
        pub fail_on_batch: Option<usize>,
        seen: usize,
    }

    impl MemorySink {
        pub fn new(batches: Arc<Mutex<Vec<Vec<LogRecord>>>>) -> Self {
            Self { batches, fail_on_batch: None, seen: 0 }
        }
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        async fn write_batch(&mut self, records: &[LogRecord]) -> Result<()> {
            if self.fail_on_batch == Some(self.seen) {
                return Err(IngestError::Insert(sqlx::Error::WorkerCrashed));
            }
            self.seen += 1;
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    /// Hands every worker a [`MemorySink`] over the same shared storage.
    pub(crate) struct MemorySinkFactory {
        pub batches: Arc<Mutex<Vec<Vec<LogRecord>>>>,
    }

    impl MemorySinkFactory {
        pub fn new() -> Self {
            Self { batches: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    #[async_trait]
    impl SinkFactory for MemorySinkFactory {
        async fn connect(&self) -> Result<Box<dyn RecordSink>> {
            Ok(Box::new(MemorySink::new(Arc::clone(&self.batches))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(ip: &str, url: &str) -> LogRecord {
        LogRecord {
            ip: ip.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2023, 10, 10)
                .unwrap()
                .and_hms_opt(13, 55, 36)
                .unwrap(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_render_single_row() {
        let sql = render_insert(&[record("192.168.1.10", "/index.html")]);
        assert_eq!(
            sql,
            "INSERT INTO `log` (ip, dt, url) VALUES \
             ('192.168.1.10', '2023-10-10 13:55:36', '/index.html')"
        );
    }

    #[test]
    fn test_render_multi_row_preserves_order() {
        let sql = render_insert(&[record("1.1.1.1", "/a"), record("2.2.2.2", "/b")]);
        assert_eq!(
            sql,
            "INSERT INTO `log` (ip, dt, url) VALUES \
             ('1.1.1.1', '2023-10-10 13:55:36', '/a'),\
             ('2.2.2.2', '2023-10-10 13:55:36', '/b')"
        );
    }

    #[test]
    fn test_render_embeds_pre_escaped_url() {
        // The parser has already escaped the quote by the time a record
        // reaches the sink.
        let sql = render_insert(&[record("1.1.1.1", r"/a\'b")]);
        assert!(sql.contains(r"'/a\'b'"));
    }
}
