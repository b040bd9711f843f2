//! Tracing setup: compact stdout output plus an optional rotating log file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber.
///
/// Always logs to stdout in compact form; when `log_dir` is given, also
/// writes daily-rotated files there. Level filtering comes from `RUST_LOG`
/// (default "info"). The returned guard must stay alive for the program's
/// lifetime or buffered file output is lost.
///
/// # Errors
/// Returns an error if the log directory cannot be created or the
/// subscriber is already initialized.
pub fn init_logging(
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(stdout_layer);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "scanner.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

            let file_filter =
                EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false)
                .compact()
                .with_filter(file_filter);

            registry.with(file_layer).init();
            Ok(Some(guard))
        }
        None => {
            registry.init();
            Ok(None)
        }
    }
}
