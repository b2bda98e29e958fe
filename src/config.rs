use std::time::Duration;

use crate::commoncrawl::{DATA_SERVER, INDEX_SERVER, USER_AGENT};
use crate::retry::RetryPolicy;

pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Endpoints and request settings shared by every call of a [crate::client::CcClient].
///
/// Timeouts bound connecting and each read separately, never the whole transfer;
/// a slow download finishes as long as bytes keep arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub index_server: String,
    pub data_server: String,
    pub user_agent: String,
    /// The catalog request has no timeout unless one is set here.
    pub catalog_timeout: Option<Duration>,
    pub search_timeout: Duration,
    pub download_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_server: INDEX_SERVER.to_string(),
            data_server: DATA_SERVER.to_string(),
            user_agent: USER_AGENT.to_string(),
            catalog_timeout: None,
            search_timeout: SEARCH_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Default settings pointed at other servers, e.g. a mirror or a local test server.
    pub fn with_servers(index_server: impl Into<String>, data_server: impl Into<String>) -> Self {
        Self {
            index_server: index_server.into(),
            data_server: data_server.into(),
            ..Self::default()
        }
    }
}
