//! czserve - HTTP server for video info and audio analysis
//!
//! Usage: czserve [--config <toml>] [--bind <addr>]

use anyhow::Result;
use cadenza_api::ServiceConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "czserve")]
#[command(about = "Serve the video info and audio analysis endpoints over HTTP", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides [server].bind_address)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            ServiceConfig::load(path)?
        }
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    config.validate()?;

    log::info!(
        "Resolver: {}, temp dir: {}, max duration: {}s",
        config.media.tool_path,
        config.media.temp_dir.display(),
        config.media.max_duration_secs
    );

    cadenza_api::http::serve(&config).await
}
