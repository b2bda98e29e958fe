//! Fetches the byte range of a single capture and writes it, untouched, to a local file.
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::{Response, StatusCode};
use thiserror::Error;
use tokio::{
    fs::OpenOptions,
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
};

use crate::{
    client::CcClient,
    commoncrawl::{ByteRange, IndexRecord},
    error::FetchError,
};

pub const DEFAULT_OUTPUT: &str = "page.warc.gz";
pub const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("record has no valid byte range (offset {offset}, length {length})")]
    InvalidRange { offset: u64, length: u64 },
    #[error("refusing to overwrite existing file {}", .0.display())]
    OutputExists(PathBuf),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{url} answered HTTP {status} instead of 206 Partial Content")]
    UnexpectedStatus { url: String, status: StatusCode },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub range: ByteRange,
    pub bytes_written: u64,
}

impl DownloadReport {
    /// The server sent exactly the requested number of bytes.
    pub fn is_complete(&self) -> bool {
        self.bytes_written == self.range.byte_count()
    }
}

/// Fails with [DownloadError::OutputExists] if `output` is taken and may not be overwritten.
pub async fn check_output(output: &Path, overwrite: bool) -> Result<(), DownloadError> {
    let exists = tokio::fs::try_exists(output)
        .await
        .map_err(|source| DownloadError::Io {
            path: output.to_path_buf(),
            source,
        })?;
    if !overwrite && exists {
        return Err(DownloadError::OutputExists(output.to_path_buf()));
    }
    Ok(())
}

/// Downloads `record`'s byte range to `output`.
///
/// An existing file is truncated when `overwrite` is set and left alone (with an error) otherwise.
/// If the transfer breaks off, whatever arrived stays on disk.
#[tracing::instrument(skip(client, record), fields(filename = %record.filename))]
pub async fn download_from_commoncrawl(
    client: &CcClient,
    record: &IndexRecord,
    output: &Path,
    overwrite: bool,
) -> Result<DownloadReport, DownloadError> {
    let range = record.byte_range().ok_or(DownloadError::InvalidRange {
        offset: record.offset,
        length: record.length,
    })?;
    let io_err = |source: std::io::Error| DownloadError::Io {
        path: output.to_path_buf(),
        source,
    };

    check_output(output, overwrite).await?;

    let response = client.fetch_range(&record.filename, range).await?;
    if response.status() != StatusCode::PARTIAL_CONTENT {
        return Err(DownloadError::UnexpectedStatus {
            url: response.url().to_string(),
            status: response.status(),
        });
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(output).await.map_err(io_err)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

    let mut bytes_written = 0;
    let streamed = copy_body(response, &mut writer, output, &mut bytes_written).await;
    // Flush before reporting a broken stream so the file holds everything received.
    let flushed = writer.flush().await.map_err(io_err);
    streamed?;
    flushed?;

    if bytes_written != range.byte_count() {
        tracing::info!(
            expected = range.byte_count(),
            received = bytes_written,
            "Server sent a different number of bytes than requested"
        );
    }
    tracing::info!("Wrote {} bytes to {}", bytes_written, output.display());
    Ok(DownloadReport {
        path: output.to_path_buf(),
        range,
        bytes_written,
    })
}

async fn copy_body<W: AsyncWrite + Unpin>(
    response: Response,
    writer: &mut W,
    path: &Path,
    bytes_written: &mut u64,
) -> Result<(), DownloadError> {
    let url = response.url().to_string();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;
        for piece in chunk.chunks(CHUNK_SIZE) {
            writer.write_all(piece).await.map_err(|source| DownloadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            *bytes_written += piece.len() as u64;
        }
    }
    Ok(())
}
