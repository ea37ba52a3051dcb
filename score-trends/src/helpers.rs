use anyhow::{Result, anyhow};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{Args, OutputFormat};

/// Installs the global subscriber, filtered by `RUST_LOG`.
///
/// Logs always go to stderr so that stdout only carries report rows. JSON-lines
/// output gets JSON logs to match.
pub fn setup_logging(args: &Args) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env());
    let installed = match args.format {
        OutputFormat::Jsonl => set_global_default(builder.json().finish()),
        OutputFormat::Pretty => set_global_default(builder.finish()),
    };
    installed.map_err(|e| anyhow!("Failed to initialize tracing: {e}"))
}
