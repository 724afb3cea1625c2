use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;

use crate::config::AppConfig;
use crate::internal_error::{InternalError, InternalResult};

/// Installs the global subscriber: stdout plus a daily file under `log_dir`.
/// The returned guard flushes the file writer and must outlive the server.
pub fn init_logging(config: &AppConfig) -> InternalResult<WorkerGuard> {
    fs::create_dir_all(&config.log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "seed_library.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| InternalError::Internal(e.to_string()))?;

    Ok(guard)
}
