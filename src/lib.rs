//! This crate backs the `cc-getpage` binary, which looks a URL up in a Common Crawl index
//! and downloads the WARC record of one of its captures.
//!
//! The flow is [session::run_session]: catalog ([client::CcClient::fetch_crawl_ids]) and
//! [select::select_crawl_id], then [search::search_commoncrawl], [select::select_record]
//! and finally [download::download_from_commoncrawl].
pub mod client;
pub mod commoncrawl;
pub mod config;
pub mod download;
pub mod error;
pub mod retry;
pub mod search;
pub mod select;
pub mod session;
pub mod table;
pub mod telemetry;
