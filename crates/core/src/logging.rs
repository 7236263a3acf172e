use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber for one component.
///
/// Lines go to `<log_dir>/<component>.<date>`, rotated daily, and to stderr
/// as well when `to_stderr` is set. `RUST_LOG` overrides the `info` level.
/// If a subscriber is already installed it stays in place.
///
/// Hold the returned guard until exit; dropping it flushes the file writer.
pub fn init_logging(log_dir: &Path, component: &str, to_stderr: bool) -> WorkerGuard {
    let (writer, guard) = file_writer(log_dir, component);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(stderr_layer)
        .try_init();
    if let Err(e) = installed {
        tracing::debug!("Keeping the existing subscriber: {}", e);
    }

    guard
}

/// Daily-rotated file appender, or a sink when the directory is unusable
fn file_writer(log_dir: &Path, component: &str) -> (NonBlocking, WorkerGuard) {
    let appender = std::fs::create_dir_all(log_dir)
        .map_err(|e| e.to_string())
        .and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(component)
                .build(log_dir)
                .map_err(|e| e.to_string())
        });

    match appender {
        Ok(appender) => tracing_appender::non_blocking(appender),
        Err(e) => {
            eprintln!("Logging to {} disabled: {}", log_dir.display(), e);
            tracing_appender::non_blocking(std::io::sink())
        }
    }
}
