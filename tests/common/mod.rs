//! In-process stand-in for the index server and the data server.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{stream, StreamExt};

use cc_getpage::client::CcClient;
use cc_getpage::config::Config;
use cc_getpage::retry::RetryPolicy;

pub const CRAWL_ID: &str = "CC-MAIN-2024-10";
pub const WARC_PATH: &str =
    "crawl-data/CC-MAIN-2024-10/segments/1707947473347.0/warc/CC-MAIN-20240220211055-20240221001055-00000.warc.gz";

pub fn catalog_json() -> String {
    format!(r#"[{{"id": "{CRAWL_ID}", "name": "Jan 2024", "cdx-api": "https://index.commoncrawl.org/{CRAWL_ID}-index"}}]"#)
}

pub fn record_line(timestamp: &str, offset: u64, length: u64) -> String {
    format!(
        r#"{{"urlkey": "com,example)/", "timestamp": "{timestamp}", "url": "https://example.com/", "mime": "text/html", "status": "200", "length": "{length}", "offset": "{offset}", "filename": "{WARC_PATH}"}}"#
    )
}

/// Deterministic archive contents, so a range can be checked against the source.
pub fn warc_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[derive(Clone)]
pub struct Fake {
    /// None answers HTTP 500.
    pub catalog: Option<String>,
    /// Consumed one per index request; the last entry repeats.
    pub index_responses: Vec<(StatusCode, String)>,
    pub warc: Vec<u8>,
    /// Answer range requests with the whole file and HTTP 200.
    pub ignore_range: bool,
    /// Answer every archive request with this status and no body.
    pub warc_status: Option<StatusCode>,
    pub drip: Option<Drip>,
}

/// Sends the archive body in pieces, pausing before each one.
#[derive(Debug, Clone, Copy)]
pub struct Drip {
    pub chunk: usize,
    pub interval: Duration,
    /// Drop the connection after this many pieces.
    pub break_after: Option<usize>,
}

impl Default for Fake {
    fn default() -> Self {
        Self {
            catalog: Some(catalog_json()),
            index_responses: vec![(StatusCode::OK, record_line("20240115000000", 1000, 500))],
            warc: warc_bytes(4096),
            ignore_range: false,
            warc_status: None,
            drip: None,
        }
    }
}

#[derive(Default)]
pub struct Hits {
    pub catalog: AtomicUsize,
    pub index: AtomicUsize,
    pub warc: AtomicUsize,
    pub last_query: Mutex<HashMap<String, String>>,
    pub last_range: Mutex<Option<String>>,
    pub last_user_agent: Mutex<Option<String>>,
}

impl Hits {
    pub fn catalog(&self) -> usize {
        self.catalog.load(Ordering::SeqCst)
    }

    pub fn index(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    pub fn warc(&self) -> usize {
        self.warc.load(Ordering::SeqCst)
    }

    pub fn last_range(&self) -> Option<String> {
        self.last_range.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn last_user_agent(&self) -> Option<String> {
        self.last_user_agent.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct ServerState {
    fake: Arc<Fake>,
    hits: Arc<Hits>,
}

pub struct FakeServer {
    pub base_url: String,
    pub hits: Arc<Hits>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    pub async fn start(fake: Fake) -> Self {
        let hits = Arc::new(Hits::default());
        let state = ServerState {
            fake: Arc::new(fake),
            hits: hits.clone(),
        };
        let app = Router::new()
            .route("/collinfo.json", get(catalog))
            .route(&format!("/{CRAWL_ID}-index"), get(index))
            .route(&format!("/{WARC_PATH}"), get(warc))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr: SocketAddr = listener.local_addr().expect("listener addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test server");
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
            _handle: handle,
        }
    }

    /// A client for this server that retries without waiting long.
    pub fn client(&self) -> CcClient {
        client_for(&self.base_url)
    }
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        retry: RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(50),
        },
        ..Config::with_servers(base_url, base_url)
    }
}

pub fn client_for(base_url: &str) -> CcClient {
    CcClient::new(config_for(base_url)).expect("build client")
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn catalog(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    state.hits.catalog.fetch_add(1, Ordering::SeqCst);
    *state.hits.last_user_agent.lock().unwrap() = user_agent(&headers);
    match &state.fake.catalog {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn index(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let n = state.hits.index.fetch_add(1, Ordering::SeqCst);
    *state.hits.last_query.lock().unwrap() = query;
    *state.hits.last_user_agent.lock().unwrap() = user_agent(&headers);
    let responses = &state.fake.index_responses;
    let (status, body) = responses
        .get(n)
        .or(responses.last())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, String::new()));
    (status, body).into_response()
}

async fn warc(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    state.hits.warc.fetch_add(1, Ordering::SeqCst);
    *state.hits.last_user_agent.lock().unwrap() = user_agent(&headers);
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    *state.hits.last_range.lock().unwrap() = range.clone();
    if let Some(status) = state.fake.warc_status {
        return status.into_response();
    }

    let data = &state.fake.warc;
    let bounds = range.as_deref().and_then(parse_range);
    match bounds {
        Some((start, end)) if !state.fake.ignore_range && start < data.len() => {
            let end = end.min(data.len() - 1);
            (
                StatusCode::PARTIAL_CONTENT,
                [(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{}", data.len()),
                )],
                body(data[start..=end].to_vec(), state.fake.drip),
            )
                .into_response()
        }
        Some(_) if !state.fake.ignore_range => StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
        _ => (StatusCode::OK, data.clone()).into_response(),
    }
}

fn body(bytes: Vec<u8>, drip: Option<Drip>) -> Body {
    let Some(drip) = drip else {
        return Body::from(bytes);
    };
    let mut pieces: Vec<Result<Vec<u8>, io::Error>> = bytes
        .chunks(drip.chunk)
        .take(drip.break_after.unwrap_or(usize::MAX))
        .map(|piece| Ok(piece.to_vec()))
        .collect();
    if drip.break_after.is_some() {
        pieces.push(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection dropped")));
    }
    let interval = drip.interval;
    Body::from_stream(stream::iter(pieces).then(move |piece| async move {
        tokio::time::sleep(interval).await;
        piece
    }))
}

fn parse_range(value: &str) -> Option<(usize, usize)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}
