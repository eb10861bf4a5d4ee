//! arview server - Main entry point
//!
//! Serves the WASM viewer, the model files and marker patterns, and the
//! catalog API the viewer starts from.

mod api;
mod config;
mod server;
mod state;

use anyhow::Result;
use arview_core::loader::GltfFileLoader;
use arview_core::Session;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "arview")]
#[command(about = "AR model viewer server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "arview.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    write_default_config: bool,

    /// Load every catalog model from disk and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("arview v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    // Override bind address if specified
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    info!(
        models = config.viewer.catalog.models.len(),
        initial = config.viewer.catalog.initial,
        root = %config.viewer.assets.root,
        "Configuration loaded"
    );

    if args.check {
        // Catalog check mode
        let loader = GltfFileLoader::new(&config.viewer.assets.root);
        let mut session = Session::new(&config.viewer)?;
        let failures = session.check_catalog(&loader).await;

        println!("Checked {} models:", config.viewer.catalog.models.len());
        for identifier in config.viewer.catalog.models.iter() {
            match failures.iter().find(|(id, _)| id == identifier) {
                Some((_, e)) => println!("  - {}: FAILED ({})", identifier, e),
                None => println!("  - {}: ok", identifier),
            }
        }
        if !failures.is_empty() {
            anyhow::bail!("{} catalog model(s) failed to load", failures.len());
        }
    } else {
        let state = state::AppState::new(config);
        server::run(state).await?;
    }

    Ok(())
}
