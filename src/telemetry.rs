use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set. Anything chattier would interleave with the prompts.
const DEFAULT_FILTER: &str = "warn";

pub fn setup_tracing() -> Result<(), anyhow::Error> {
    // construct a subscriber that prints formatted traces to stderr, stdout belongs to the prompts
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // use that subscriber to process traces emitted after this point
    tracing::subscriber::set_global_default(subscriber)?;
    tracing::debug!("Tracing initialized");
    Ok(())
}
