//! Tracing subscriber setup: console layer plus an optional rolling file.

use std::path::Path;

use eyre::WrapErr;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use venitrain_config::Logging;

use crate::cli::FILE_GUARD;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. Console output goes to stderr so stdout stays
/// free for session output. The file sink always writes JSON lines.
pub fn init(json: bool, level: &str, logging: &Logging) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let (pretty, structured) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(fmt::layer().with_target(false).with_writer(std::io::stderr)),
            None,
        )
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => rolling::daily(dir, name),
                Some("hourly") => rolling::hourly(dir, name),
                _ => rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(structured)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
