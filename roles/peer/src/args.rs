use std::path::PathBuf;

use clap::Parser;
use ext_config::{Config, File, FileFormat};
use peer_bolt8::{config::PeerConfig, error::PeerError};

use tracing::error;

/// CLI argument parser for the peer binary.
///
/// Supports the following flags:
/// - `-c`, `--config`: specify a custom config file path
/// - `-f`, `--log-file`: also write logs to this file
/// - `-h`, `--help`: print help and usage info
#[derive(Parser, Debug)]
#[command(author, version, about = "BOLT 8 peer", long_about = None)]
pub struct Args {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the TOML configuration file",
        default_value = "peer-config.toml"
    )]
    pub config_path: PathBuf,
    #[arg(
        short = 'f',
        long = "log-file",
        help = "Path to the log file. If not set, logs will only be written to stdout."
    )]
    pub log_file: Option<PathBuf>,
}

/// Process CLI args and load configuration.
pub fn process_cli_args() -> Result<PeerConfig, PeerError> {
    let args = Args::parse();

    let config_path = args.config_path.to_str().ok_or_else(|| {
        error!("Invalid configuration path.");
        PeerError::BadCliArgs
    })?;

    let settings = Config::builder()
        .add_source(File::new(config_path, FileFormat::Toml))
        .build()
        .map_err(|e| PeerError::BadConfig(format!("Failed to build config: {}", e)))?;

    let mut config = settings
        .try_deserialize::<PeerConfig>()
        .map_err(|e| PeerError::BadConfig(format!("Failed to deserialize config: {}", e)))?;

    config.set_log_file(args.log_file);

    Ok(config)
}
