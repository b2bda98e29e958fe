use std::io::{self, Write};

use crate::{
    client::CcClient,
    commoncrawl::IndexRecord,
    retry::{FailureKind, RetryDecision},
    table::record_table,
};

/// Result of looking a URL up in a crawl's index.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Vec<IndexRecord>),
    NotFound,
    /// The index could not be queried; carries the last error message.
    Failed(String),
}

/// Queries the index of `crawl_id` for `url`, retrying transient failures with the client's
/// [crate::retry::RetryPolicy]. Progress and the result table are written to `out`.
pub async fn search_commoncrawl<W: Write>(
    client: &CcClient,
    url: &str,
    crawl_id: &str,
    out: &mut W,
) -> io::Result<SearchOutcome> {
    let policy = client.config().retry;
    writeln!(out, "\nSearching index for {url} in crawl {crawl_id}...")?;

    let mut attempt = 1;
    loop {
        let err = match client.query_index(url, crawl_id).await {
            Ok(records) if records.is_empty() => {
                writeln!(out, "No results found in the index.")?;
                return Ok(SearchOutcome::NotFound);
            }
            Ok(records) => {
                writeln!(out, "\nFound {} results:\n", records.len())?;
                writeln!(out, "{}", record_table(&records))?;
                return Ok(SearchOutcome::Found(records));
            }
            Err(err) => err,
        };

        let kind = err.kind();
        writeln!(
            out,
            "Error fetching index (attempt {attempt}/{}): {err}",
            policy.max_attempts
        )?;
        match policy.decide(attempt, kind) {
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(attempt, ?kind, err.msg = %err, "Index query failed, retrying");
                writeln!(out, "Retrying in {} seconds...", delay.as_secs_f64())?;
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            RetryDecision::GiveUp => {
                tracing::info!(attempt, ?kind, err.msg = %err, err.details = ?err, "Index query failed");
                if kind == FailureKind::Transient {
                    writeln!(out, "Failed after multiple attempts.")?;
                }
                return Ok(SearchOutcome::Failed(err.to_string()));
            }
        }
    }
}
