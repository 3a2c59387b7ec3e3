//! rest-mount demo server.
//!
//! Serves a small read-only library:
//!
//! ```text
//! GET /authors
//! GET /authors/{author_id}
//! GET /authors/{author_id}/books
//! GET /authors/{author_id}/books/{book_id}
//! ```

mod demo;

use std::path::PathBuf;

use clap::Parser;
use rest_mount::config::{self, ServerConfig};
use rest_mount::lifecycle;
use rest_mount::observability::logging;

#[derive(Parser)]
#[command(name = "rest-mount")]
#[command(about = "Demo server for nested RESTful resource routing", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rest-mount starting");

    // A bad mount is a programming error: refuse to start.
    let routes = demo::routes()?;

    lifecycle::serve(config, routes).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
