//! Tracing setup
//!
//! 日志输出到 stderr 和 `<data_dir>/logs/seatmap.log.YYYY-MM-DD`（按天滚动）

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "seatmap.log";

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        from_env
    } else if verbose || cfg!(debug_assertions) {
        EnvFilter::new("info,seatmap=debug,seatmap_lib=debug,seatmap_client=debug")
    } else {
        EnvFilter::new("warn,seatmap_lib=info")
    }
}

/// Install the global subscriber
///
/// Keep the returned guard alive for the lifetime of the process, dropping
/// it flushes the file writer.
pub fn init_tracing(log_dir: &Path, verbose: bool) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking_file);

    // stdout carries command output, logs go to stderr
    let stderr_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::debug!(path = %log_dir.display(), "Tracing initialized");
    Ok(guard)
}
