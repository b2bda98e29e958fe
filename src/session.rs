//! One run of the tool: pick a crawl, search its index, pick a record, download it.
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use crate::{
    client::CcClient,
    download::{check_output, download_from_commoncrawl, DownloadReport, DEFAULT_OUTPUT},
    search::{search_commoncrawl, SearchOutcome},
    select::{select_crawl_id, select_record, DEFAULT_PER_PAGE},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub per_page: usize,
    pub output: PathBuf,
    pub overwrite: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            output: PathBuf::from(DEFAULT_OUTPUT),
            overwrite: true,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The catalog could not be fetched or was empty.
    CatalogUnavailable,
    /// The operator quit the crawl selection.
    SelectionAborted,
    NoResults,
    SearchFailed(String),
    /// Input ended before a record was picked.
    NoRecordChosen,
    Downloaded(DownloadReport),
    DownloadFailed(String),
}

impl SessionOutcome {
    /// Only an unusable catalog and an aborted crawl selection count as failures;
    /// an empty or failed search and a failed download end the run normally.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SessionOutcome::CatalogUnavailable | SessionOutcome::SelectionAborted
        )
    }
}

/// Runs the whole interaction. When a non-empty `crawl_id` is given the catalog is never fetched.
pub async fn run_session<R: BufRead, W: Write>(
    client: &CcClient,
    url: &str,
    crawl_id: Option<&str>,
    options: &SessionOptions,
    input: &mut R,
    out: &mut W,
) -> io::Result<SessionOutcome> {
    // An empty id on the command line means "let me pick one".
    let crawl_id = match crawl_id.filter(|id| !id.trim().is_empty()) {
        Some(crawl_id) => crawl_id.to_string(),
        None => {
            let crawls = match client.fetch_crawl_ids().await {
                Ok(crawls) => crawls,
                Err(e) => {
                    tracing::debug!(err.msg = %e, err.details = ?e, "Failed to fetch crawl catalog");
                    writeln!(out, "Error fetching crawl IDs: {e}")?;
                    Vec::new()
                }
            };
            if crawls.is_empty() {
                return Ok(SessionOutcome::CatalogUnavailable);
            }
            match select_crawl_id(&crawls, options.per_page, input, out)? {
                Some(crawl_id) => crawl_id,
                None => return Ok(SessionOutcome::SelectionAborted),
            }
        }
    };

    let records = match search_commoncrawl(client, url, &crawl_id, out).await? {
        SearchOutcome::Found(records) => records,
        SearchOutcome::NotFound => return Ok(SessionOutcome::NoResults),
        SearchOutcome::Failed(reason) => return Ok(SessionOutcome::SearchFailed(reason)),
    };

    let Some(record) = select_record(&records, input, out)? else {
        return Ok(SessionOutcome::NoRecordChosen);
    };

    let downloaded = match check_output(&options.output, options.overwrite).await {
        Ok(()) => {
            writeln!(
                out,
                "\nDownloading {} bytes from {}...",
                record.length,
                client.warc_url(&record.filename)
            )?;
            download_from_commoncrawl(client, record, &options.output, options.overwrite).await
        }
        Err(e) => Err(e),
    };
    match downloaded {
        Ok(report) => {
            if !report.is_complete() {
                writeln!(
                    out,
                    "Warning: expected {} bytes, received {}.",
                    report.range.byte_count(),
                    report.bytes_written
                )?;
            }
            writeln!(out, "Saved to {}", report.path.display())?;
            Ok(SessionOutcome::Downloaded(report))
        }
        Err(e) => {
            tracing::debug!(err.msg = %e, err.details = ?e, "Download failed");
            writeln!(out, "Failed to download: {e}")?;
            Ok(SessionOutcome::DownloadFailed(e.to_string()))
        }
    }
}
