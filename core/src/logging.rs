//! Tracing subscriber setup for embedders that want the sidebar's logs.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "sidebar.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber described by `logging`.
///
/// `RUST_LOG`, when set, takes precedence over `logging.level`.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        anyhow::bail!("logging disabled for both console and file");
    }

    let filter = build_filter(logging)?;
    let file_writer = match log_dir(logging)? {
        Some(dir) => Some(file_writer(dir)?),
        None => None,
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });
    let file_layer = file_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("global tracing subscriber already installed")?;

    Ok(())
}

fn build_filter(logging: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("invalid log level {:?}", logging.level)),
    }
}

/// Directory for the file sink. The sidebar runs inside a host process, so
/// the host picks where its files go.
fn log_dir(logging: &LoggingConfig) -> anyhow::Result<Option<PathBuf>> {
    if !logging.file {
        return Ok(None);
    }
    match logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(d) => Ok(Some(PathBuf::from(d))),
        None => anyhow::bail!("file logging requires logging.directory"),
    }
}

/// Daily-rotated `sidebar.log.<date>` files, written off the caller's thread.
fn file_writer(dir: PathBuf) -> anyhow::Result<NonBlocking> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create log dir {} failed", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    // First guard wins; a second init fails in try_init anyway.
    let _ = LOG_GUARD.set(guard);
    Ok(non_blocking)
}
