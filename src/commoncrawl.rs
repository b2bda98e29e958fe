//! This module contains helper functions and structs for de-serializing CommonCrawl-specific data structures.
use serde::Deserialize;
use serde_aux::prelude::deserialize_number_from_string;
use serde_json::{Map, Value};

use crate::error::FetchError;

pub const INDEX_SERVER: &str = "https://index.commoncrawl.org";
pub const DATA_SERVER: &str = "https://data.commoncrawl.org";
pub const USER_AGENT: &str = "cc-getpage/1.0";

/// One entry of `collinfo.json`.
/// Only `id` and `name` are looked at; the remaining fields (`timegate`, `cdx-api`, ...) are kept as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrawlDescriptor {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Represents a line of the JSON output of a crawl's index server.
///
/// ```json
/// {
///     "urlkey": "com,example)/",
///     "timestamp": "20240115000000",
///     "url": "https://example.com/",
///     "mime": "text/html",
///     "status": "200",
///     "digest": "5JOQMMSNM6N7UCLGGYXDSPSB3FYAQS2C",
///     "length": "500",
///     "offset": "1000",
///     "filename": "crawl-data/CC-MAIN-2024-10/segments/1707947473347.0/warc/CC-MAIN-20240220211055-20240221001055-00000.warc.gz"
/// }
/// ```
///
/// The index server encodes numbers as strings, so `offset` and `length` accept both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexRecord {
    #[serde(default)]
    pub urlkey: String,
    pub timestamp: String,
    #[serde(default)]
    pub url: String,
    pub filename: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub offset: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub length: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexRecord {
    /// The last path segment of `filename`.
    pub fn warc_file(&self) -> &str {
        self.filename.rsplit('/').next().unwrap_or(self.filename.as_str())
    }

    pub fn byte_range(&self) -> Option<ByteRange> {
        ByteRange::new(self.offset, self.length)
    }
}

/// Inclusive byte range `start..=end` inside a WARC file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Returns none for an empty range or if `offset + length - 1` overflows.
    pub fn new(offset: u64, length: u64) -> Option<Self> {
        let last = length.checked_sub(1)?;
        Some(Self {
            start: offset,
            end: offset.checked_add(last)?,
        })
    }

    /// Number of bytes covered, always at least one.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Deserialize the newline-delimited JSON body of an index query into [IndexRecord]s.
/// Blank lines are skipped. A line that does not parse, or whose byte range is empty,
/// fails the whole body.
pub fn parse_index_lines(body: &str) -> Result<Vec<IndexRecord>, FetchError> {
    let mut records = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: IndexRecord = serde_json::from_str(line)
            .map_err(|source| FetchError::MalformedLine { line: idx + 1, source })?;
        if record.byte_range().is_none() {
            return Err(FetchError::InvalidRecord {
                line: idx + 1,
                reason: format!(
                    "offset {} and length {} do not form a byte range",
                    record.offset, record.length
                ),
            });
        }
        records.push(record);
    }
    Ok(records)
}
