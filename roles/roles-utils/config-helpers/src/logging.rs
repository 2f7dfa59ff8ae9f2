use std::{fmt, fs::OpenOptions, io, path::Path, str::FromStr, sync::Mutex};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug)]
pub enum Error {
    /// The log file could not be opened for appending.
    LogFile(io::Error),
    /// A global subscriber was already installed.
    AlreadyInitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LogFile(e) => write!(f, "Failed to open log file: {}", e),
            Error::AlreadyInitialized => write!(f, "Logging is already initialized"),
        }
    }
}

impl std::error::Error for Error {}

/// Level used when `RUST_LOG` is unset or does not name a level.
pub fn level_from_env(rust_log: Option<&str>) -> LevelFilter {
    rust_log
        .and_then(|l| LevelFilter::from_str(l).ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Initialize logging to stdout and optionally to a file.
///
/// If `log_file` is Some, logs are appended to it as well as written to stdout. The level is read
/// from `RUST_LOG` and defaults to "info".
pub fn init_logging(log_file: Option<&Path>) -> Result<(), Error> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = EnvFilter::new(level_from_env(rust_log.as_deref()).to_string());
    let stdout_layer = tracing_fmt::layer().with_writer(io::stdout);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(Error::LogFile)?;
            let file_layer = tracing_fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            Box::new(
                Registry::default()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer),
            )
        }
        None => Box::new(Registry::default().with(env_filter).with(stdout_layer)),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(|_| Error::AlreadyInitialized)
}
