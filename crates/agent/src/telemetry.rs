//! Logging bootstrap for binaries embedding the turn runtime.

use amica_core::config::{LogFormat, LoggingConfig};
use tracing::Level;

/// Installs the global tracing subscriber from the logging section of the
/// app config. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .pretty()
            .try_init(),
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(level).json().try_init()
        }
    };

    let _ = result;
}
