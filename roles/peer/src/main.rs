//! Entry point for the BOLT 8 peer.
//!
//! This binary parses CLI arguments, loads the TOML configuration file, and starts the runtime
//! defined in `peer_bolt8::Peer`, which accepts inbound connections and dials the configured
//! peers.
mod args;
use args::process_cli_args;
use config_helpers_bolt8::logging::init_logging;
use peer_bolt8::Peer;

#[tokio::main]
async fn main() {
    let config = match process_cli_args() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging is not set up yet.
            eprintln!("Failed to process CLI arguments: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_logging(config.log_file()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    if let Err(e) = Peer::new(config).start().await {
        tracing::error!("Peer stopped: {}", e);
        std::process::exit(1);
    }
}
