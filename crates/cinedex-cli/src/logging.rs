use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Directives used when `RUST_LOG` is unset.
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,cinedex=info",
        // -v: our crates at debug, HTTP plumbing stays quiet
        1 => "warn,cinedex=debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr, or to a daily-rotated
/// file when `log_file` is given. The returned guard flushes the file writer
/// and must live until exit.
pub fn init(
    verbose: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
    };
    let registry = Registry::default().with(filter);

    let Some(log_path) = log_file else {
        registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(io::stderr),
            )
            .init();
        return Ok(None);
    };

    let dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file name: {}", log_path.display()))?;
    // "cinedex.log" rotates as cinedex.2026-01-17.log
    let (prefix, suffix) = file_name.rsplit_once('.').unwrap_or((file_name, "log"));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix(suffix)
        .build(dir)
        .context("creating rolling log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    registry
        .with(
            fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}
