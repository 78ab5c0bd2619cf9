//! ecr-porter CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use porter_cli::commands::{dispatch, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.resolve_config();

    // RUST_LOG wins over the configured level
    let level = config.as_ref().map(|c| c.log_level).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match config {
        Ok(config) => dispatch(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
