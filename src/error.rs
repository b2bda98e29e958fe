use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::FailureKind;

/// Failures of a single request against the index or data server.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {}", error_chain(.source))]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed index line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid index record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// `error decoding response body: operation timed out` rather than only the outermost message.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl FetchError {
    /// Connection problems, timeouts, interrupted bodies and overloaded servers are worth another attempt.
    /// Everything else will fail the same way again.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Request { source, .. } => {
                if source.is_connect() || source.is_timeout() || source.is_body() || source.is_request() {
                    FailureKind::Transient
                } else {
                    FailureKind::Fatal
                }
            }
            FetchError::Status { status, .. } => match *status {
                StatusCode::TOO_MANY_REQUESTS
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => FailureKind::Transient,
                _ => FailureKind::Fatal,
            },
            FetchError::Decode { .. }
            | FetchError::MalformedLine { .. }
            | FetchError::InvalidRecord { .. } => FailureKind::Fatal,
        }
    }
}
