//! Access-log line parsing and normalization
//!
//! One combined/common-format line yields one [`LogRecord`]: the leading IPv4
//! address, the bracketed timestamp converted to a timezone-naive UTC instant
//! (the destination DATETIME column carries no timezone), and the request
//! target escaped for literal embedding and truncated to 500 characters.
//! Matching is anchored and strict; a non-conforming line is a hard parse
//! failure, not a skip.

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::error::{IngestError, Result};

/// Maximum stored URL length; longer targets are truncated, never rejected.
pub const MAX_URL_LEN: usize = 500;

/// Anchored pattern for one access-log line: IPv4, bracketed
/// `DD/Mon/YYYY:HH:MM:SS +ZZZZ` timestamp, then the request target as the
/// second whitespace-delimited token of the quoted request line.
const LINE_PATTERN: &str = r#"^(?P<ip>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b.*?\[(?P<ts>\d{2}/\w{3}/\d{4}:\d+:\d{2}:\d{2}\s[+-]\d{4})\]\s"\w+\s(?P<url>\S+)\s"#;

/// Timestamp layout inside the brackets, offset included.
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One normalized row destined for the `log` table.
///
/// Derived from exactly one input line and immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Client address, dotted-quad form
    pub ip: String,
    /// UTC instant with the offset already applied and stripped
    pub timestamp: NaiveDateTime,
    /// Request target, escaped and truncated to [`MAX_URL_LEN`]
    pub url: String,
}

/// Parser for combined/common access-log lines.
///
/// Compiles the line pattern once; construct one per worker and reuse it for
/// every line of the chunk.
pub struct LineParser {
    pattern: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        // The pattern is a compile-time constant; failing to compile is a bug.
        let pattern = Regex::new(LINE_PATTERN).expect("line pattern must compile");
        Self { pattern }
    }

    /// Parse and normalize one raw log line.
    ///
    /// Pure function of the line: no side effects, no shared state.
    pub fn parse(&self, line: &str) -> Result<LogRecord> {
        let caps = self
            .pattern
            .captures(line)
            .ok_or_else(|| IngestError::parse(line))?;

        let timestamp =
            normalize_timestamp(&caps["ts"]).map_err(|_| IngestError::parse(line))?;

        Ok(LogRecord {
            ip: caps["ip"].to_string(),
            timestamp,
            url: normalize_url(&caps["url"]),
        })
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the bracketed timestamp with its UTC offset, convert to UTC and
/// strip the offset. The destination DATETIME type is timezone-naive.
fn normalize_timestamp(ts: &str) -> chrono::ParseResult<NaiveDateTime> {
    Ok(DateTime::parse_from_str(ts, TIMESTAMP_FORMAT)?.naive_utc())
}

/// Escape the request target for literal embedding, then truncate.
///
/// Escaping runs first; the cut applies to the escaped form.
fn normalize_url(url: &str) -> String {
    escape_literal(url).chars().take(MAX_URL_LEN).collect()
}

/// Escape a string for embedding inside a single-quoted MySQL literal.
///
/// Covers the connector escape set: backslash, both quote kinds, NUL,
/// newline, carriage return and ctrl-Z.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\x1a' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_round_trip() {
        let parser = LineParser::new();
        let line = r#"192.168.1.10 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;

        let record = parser.parse(line).unwrap();
        assert_eq!(record.ip, "192.168.1.10");
        assert_eq!(record.timestamp, ts(2023, 10, 10, 13, 55, 36));
        assert_eq!(record.url, "/index.html");
    }

    #[test]
    fn test_timezone_normalized_to_utc() {
        let parser = LineParser::new();
        let utc = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /a HTTP/1.1" 200 1"#;
        let est = r#"10.0.0.1 - - [10/Oct/2023:08:55:36 -0500] "GET /a HTTP/1.1" 200 1"#;

        let a = parser.parse(utc).unwrap();
        let b = parser.parse(est).unwrap();
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(b.timestamp, ts(2023, 10, 10, 13, 55, 36));
    }

    #[test]
    fn test_url_truncated_to_limit() {
        let parser = LineParser::new();
        let target = format!("/{}", "x".repeat(599));
        let line = format!(
            r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET {} HTTP/1.1" 200 1"#,
            target
        );

        let record = parser.parse(&line).unwrap();
        assert_eq!(record.url.chars().count(), MAX_URL_LEN);
        assert_eq!(record.url, target[..MAX_URL_LEN]);
    }

    #[test]
    fn test_missing_timestamp_is_parse_error() {
        let parser = LineParser::new();
        let line = r#"192.168.1.10 - - "GET /index.html HTTP/1.1" 200 512"#;

        let err = parser.parse(line).unwrap_err();
        match err {
            IngestError::Parse { line: l } => assert_eq!(l, line),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_line_is_parse_error() {
        let parser = LineParser::new();
        assert!(parser.parse("not a log line").is_err());
        assert!(parser.parse("").is_err());
    }

    #[test]
    fn test_url_quote_is_escaped() {
        let parser = LineParser::new();
        let line = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /a'b HTTP/1.1" 200 1"#;

        let record = parser.parse(line).unwrap();
        assert_eq!(record.url, r"/a\'b");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("plain"), "plain");
        assert_eq!(escape_literal(r"a\b"), r"a\\b");
        assert_eq!(escape_literal("a'b"), r"a\'b");
        assert_eq!(escape_literal("a\"b"), r#"a\"b"#);
        assert_eq!(escape_literal("a\nb"), r"a\nb");
        assert_eq!(escape_literal("a\rb"), r"a\rb");
        assert_eq!(escape_literal("a\0b"), r"a\0b");
        assert_eq!(escape_literal("a\x1ab"), r"a\Zb");
    }
}
