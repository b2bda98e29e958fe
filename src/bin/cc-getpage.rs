//! Looks a URL up in a Common Crawl index and downloads the WARC record of one of its captures.
//!
//! Without a crawl id the available crawls are listed from `collinfo.json` and one is picked interactively.
//! The crawl's index is then queried for the URL, and the chosen capture is fetched with a single
//! range request against the data server:
//!
//! ```text
//! GET https://data.commoncrawl.org/crawl-data/CC-MAIN-2024-10/segments/.../warc/....warc.gz
//! Range: bytes=1000-1499
//! ```
//!
//! The response body is written as-is, so the output is a gzip member containing one WARC record.
use std::{
    io::Write,
    path::PathBuf,
    process::{self, ExitCode},
    time::Duration,
};

use anyhow::{Context, Result};
use cc_getpage::{
    client::CcClient,
    commoncrawl::{DATA_SERVER, INDEX_SERVER},
    config::Config,
    download::DEFAULT_OUTPUT,
    retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS},
    select::DEFAULT_PER_PAGE,
    session::{run_session, SessionOptions},
    telemetry::setup_tracing,
};
use clap::{error::ErrorKind, Parser};

/// 128 + SIGINT, what a shell reports for a job stopped with Ctrl-C.
const INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The URL to look up, e.g. `example.com` or `example.com/*`.
    url: String,

    /// The crawl to search, e.g. `CC-MAIN-2024-10`. If omitted, a crawl is picked from the catalog.
    crawl_id: Option<String>,

    /// Where the downloaded WARC record is written.
    #[arg(short('o'), long("output"), default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Exit with an error instead of overwriting an existing output file.
    #[arg(long("no-clobber"))]
    no_clobber: bool,

    /// Number of crawls shown per page in the crawl selection.
    #[arg(long("per-page"), default_value_t = DEFAULT_PER_PAGE as u64,
    value_parser = clap::value_parser!(u64).range(1..=100))]
    per_page: u64,

    /// Total number of attempts for the index query.
    #[arg(long("retries"), default_value_t = DEFAULT_MAX_ATTEMPTS,
    value_parser = clap::value_parser!(u32).range(1..=20))]
    retries: u32,

    /// Seconds to wait between attempts of the index query.
    #[arg(long("retry-delay"), default_value_t = 5)]
    retry_delay: u64,

    #[arg(long("index-server"), env("CC_INDEX_SERVER"), default_value = INDEX_SERVER)]
    index_server: String,

    #[arg(long("data-server"), env("CC_DATA_SERVER"), default_value = DATA_SERVER)]
    data_server: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    setup_tracing()?;
    // The session blocks on stdin and on retry sleeps; Ctrl-C ends it from any of those points.
    ctrlc::set_handler(|| {
        let mut out = std::io::stdout();
        let _ = writeln!(out, "\nExiting...");
        let _ = out.flush();
        process::exit(INTERRUPTED);
    })
    .context("Failed to install the Ctrl-C handler")?;

    let config = Config {
        retry: RetryPolicy {
            max_attempts: args.retries,
            delay: Duration::from_secs(args.retry_delay),
        },
        ..Config::with_servers(args.index_server, args.data_server)
    };
    let client = CcClient::new(config).context("Failed to build the HTTP client")?;
    let options = SessionOptions {
        per_page: args.per_page as usize,
        output: args.output,
        overwrite: !args.no_clobber,
    };

    let mut input = std::io::stdin().lock();
    let mut out = std::io::stdout();
    let outcome = run_session(
        &client,
        &args.url,
        args.crawl_id.as_deref(),
        &options,
        &mut input,
        &mut out,
    )
    .await
    .context("Lost the terminal")?;
    tracing::debug!(?outcome, "Session finished");

    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
