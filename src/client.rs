//! HTTP access to the index server and the data server.
use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};

use crate::{
    commoncrawl::{parse_index_lines, ByteRange, CrawlDescriptor, IndexRecord},
    config::Config,
    error::FetchError,
};

/// One connection pool per endpoint, because each has its own timeouts.
#[derive(Debug, Clone)]
pub struct CcClient {
    catalog_http: Client,
    index_http: Client,
    data_http: Client,
    config: Config,
}

impl CcClient {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            catalog_http: http_client(&config.user_agent, config.catalog_timeout)?,
            index_http: http_client(&config.user_agent, Some(config.search_timeout))?,
            data_http: http_client(&config.user_agent, Some(config.download_timeout))?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn collinfo_url(&self) -> String {
        format!("{}/collinfo.json", self.config.index_server.trim_end_matches('/'))
    }

    pub fn index_url(&self, crawl_id: &str) -> String {
        format!(
            "{}/{}-index",
            self.config.index_server.trim_end_matches('/'),
            crawl_id
        )
    }

    pub fn warc_url(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.config.data_server.trim_end_matches('/'),
            filename.trim_start_matches('/')
        )
    }

    /// Fetches the list of available crawls from `collinfo.json`. Not retried.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_crawl_ids(&self) -> Result<Vec<CrawlDescriptor>, FetchError> {
        let url = self.collinfo_url();
        let response = self
            .catalog_http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        let body = success_body(&url, response).await?;
        let crawls: Vec<CrawlDescriptor> =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })?;
        tracing::info!("Fetched {} crawl descriptors", crawls.len());
        Ok(crawls)
    }

    /// One query against a crawl's index. A 404 is how the index server says "no captures",
    /// so it comes back as an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn query_index(
        &self,
        url: &str,
        crawl_id: &str,
    ) -> Result<Vec<IndexRecord>, FetchError> {
        let endpoint = self.index_url(crawl_id);
        let response = self
            .index_http
            .get(&endpoint)
            .query(&[("url", url), ("output", "json")])
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: endpoint.clone(),
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Index server has no captures for {}", url);
            return Ok(Vec::new());
        }
        let body = success_body(&endpoint, response).await?;
        parse_index_lines(&body)
    }

    /// Sends the ranged request for `filename`. The caller checks the status and consumes the body.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_range(
        &self,
        filename: &str,
        range: ByteRange,
    ) -> Result<Response, FetchError> {
        let url = self.warc_url(filename);
        tracing::info!("Fetching {} from {}", range.header_value(), url);
        self.data_http
            .get(&url)
            .header(header::RANGE, range.header_value())
            .send()
            .await
            .map_err(|source| FetchError::Request { url, source })
    }
}

/// `timeout` applies to connecting and to every read, like a socket timeout.
fn http_client(user_agent: &str, timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.connect_timeout(timeout).read_timeout(timeout);
    }
    builder.build()
}

async fn success_body(url: &str, response: Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }
    response.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })
}
