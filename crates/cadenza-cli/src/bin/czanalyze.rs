//! czanalyze - Audio feature extraction for a single file
//!
//! Usage: czanalyze <audio_file_path>
//!
//! Prints exactly one line of JSON on stdout.

use anyhow::Result;
use cadenza_api::ServiceConfig;
use cadenza_cli::output::{print_json_line, AnalysisOutput};
use cadenza_core::{analyze_audio, AnalysisConfig, FeatureVector};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "czanalyze")]
#[command(about = "Extract tempo, key, mood and spectral descriptors from an audio file", long_about = None)]
struct Args {
    /// Input audio file path
    audio_file_path: PathBuf,

    /// TOML file whose [analysis] section overrides the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            print_json_line(&AnalysisOutput::usage("czanalyze"));
            std::process::exit(1);
        }
    };

    // Default: no logs (clean JSON output for parsing)
    let level = if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let result = run(&args.audio_file_path, args.config.as_deref());
    print_json_line(&AnalysisOutput::from_result(result));
}

fn run(audio_path: &Path, config_path: Option<&Path>) -> Result<FeatureVector> {
    let config = match config_path {
        Some(path) => ServiceConfig::load(path)?.analysis,
        None => AnalysisConfig::default(),
    };

    analyze_audio(audio_path, &config)
}
