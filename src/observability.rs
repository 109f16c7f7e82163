//! Structured diagnostics for the codec and remapper.
//!
//! `log_metric!` renders a flat `key=value` record and hands it to the `log`
//! facade at debug level, so hosts decide where it goes (the Python
//! `enable_verbose_logging` hook, a test logger, or nowhere at all).
//!
//! `enable_logging` is the one place this crate installs a logger itself.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::LoggingError;

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use needlework::log_metric;
/// let records = 42;
/// log_metric!("event" = "decode", "records" = records);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if ::log::log_enabled!(::log::Level::Debug) {
            let parts: Vec<String> = vec![$(format!("{}={}", $key, $value)),+];
            ::log::debug!("NEEDLEWORK_METRIC: {}", parts.join(" "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` that prints `[LEVEL] message` lines to stderr, or
/// appends them to `log_file`.
///
/// Only the first call installs anything. A later call without a file is a
/// no-op; a later call with a file is an error and leaves the file untouched.
pub fn enable_logging(log_file: Option<&str>, debug: bool) -> Result<(), LoggingError> {
    if INIT_LOGGER.is_completed() {
        return match log_file {
            Some(path) => Err(LoggingError::AlreadyEnabled {
                path: path.to_string(),
            }),
            None => Ok(()),
        };
    }

    let file = log_file
        .map(|path| {
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.to_string(),
                    source,
                })
        })
        .transpose()?;

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        // A host may already own the global logger; ours then stays unused.
        let _ = builder.try_init();
    });
    Ok(())
}
