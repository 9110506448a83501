// src/main.rs — wkcache entry point

use clap::Parser;

use wkcache::cli::{commands, Cli};
use wkcache::infra::config::Config;
use wkcache::infra::logger;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        // Already reported by the renderer.
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    // RUST_LOG still wins over the configured level
    logger::init_logging(&config.logging.level);

    commands::run(&cli, &config).await
}
