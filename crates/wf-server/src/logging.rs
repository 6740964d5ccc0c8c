//! Process-wide logging setup.
//!
//! [`init_logging`] installs a subscriber writing to stdout and to a rolling
//! file. The returned [`LogHandle`] owns the file writer's worker; dropping
//! it flushes and closes the file, so the binary holds it until exit.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wf_core::config::{Config, LogRotation};
use wf_core::{Error, Result};

use crate::storage::ensure_dir;

/// Keeps the file writer alive.
#[must_use = "dropping the handle closes the log file"]
pub struct LogHandle {
    _guard: WorkerGuard,
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "watchify=trace,wf_server=trace,wf_db=debug,wf_core=debug,tower_http=debug"
    } else {
        "watchify=info,wf_server=info,wf_db=info,tower_http=info"
    }
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// Install the global subscriber.
pub async fn init_logging(config: &Config, verbose: bool) -> Result<LogHandle> {
    let dir = config.log_dir();
    ensure_dir(&dir).await?;

    let appender = RollingFileAppender::builder()
        .rotation(rotation(config.logging.rotation))
        .filename_prefix(&config.logging.file_prefix)
        .build(&dir)
        .map_err(|e| Error::Internal(format!("Failed to open log file in {}: {e}", dir.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .map_err(|e| Error::Internal(format!("Invalid log filter: {e}")))?;

    let file_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Logging already initialised: {e}")))?;

    tracing::debug!(dir = %dir.display(), rotation = ?config.logging.rotation, "Logging initialised");
    Ok(LogHandle { _guard: guard })
}
