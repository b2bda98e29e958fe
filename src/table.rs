//! Plain-text tables for the interactive prompts.
use std::ops::Range;

use tabled::{settings::Style, Table, Tabled};

use crate::commoncrawl::{CrawlDescriptor, IndexRecord};

#[derive(Tabled)]
struct CrawlRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "Crawl ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "WARC File")]
    warc_file: String,
}

/// Rows `window` of `crawls`, numbered by their position in the full list starting at 1.
pub fn crawl_table(crawls: &[CrawlDescriptor], window: Range<usize>) -> String {
    let start = window.start;
    let rows = crawls[window].iter().enumerate().map(|(i, crawl)| CrawlRow {
        number: start + i + 1,
        id: crawl.id.clone(),
        name: crawl.name.clone(),
    });
    render(rows)
}

pub fn record_table(records: &[IndexRecord]) -> String {
    let rows = records.iter().enumerate().map(|(i, record)| RecordRow {
        number: i + 1,
        timestamp: record.timestamp.clone(),
        size: record.length,
        warc_file: record.warc_file().to_string(),
    });
    render(rows)
}

fn render<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::blank());
    table.to_string()
}
