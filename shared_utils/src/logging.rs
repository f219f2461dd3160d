//! tracing setup for the command-line tools.
//!
//! Two sinks are installed: a daily-rolling plain-text file
//! (`<program>.log.<date>`) that records everything at the configured level,
//! and an optional colored stderr mirror with its own level so routine INFO
//! events do not tear through the progress bar. `RUST_LOG` replaces the
//! default target filter entirely.
//!
//! ```no_run
//! use shared_utils::logging::{init_logging, LogConfig};
//!
//! init_logging("heic_jpeg", LogConfig::default()).expect("logging");
//! tracing::info!(files = 12, "Batch started");
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Where rotated log files live. Defaults to the system temp directory.
    pub directory: PathBuf,
    /// Rotated files kept per program; older ones are pruned at start-up.
    pub retained_files: usize,
    /// Level for the program's own targets and `shared_utils`.
    pub level: Level,
    /// Level of the stderr mirror. `None` keeps stderr free of log lines.
    pub stderr_level: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: std::env::temp_dir(),
            retained_files: 5,
            level: Level::INFO,
            stderr_level: Some(Level::WARN),
        }
    }
}

impl LogConfig {
    /// Everything at DEBUG, on both sinks.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            stderr_level: Some(Level::DEBUG),
            ..Self::default()
        }
    }
}

fn default_directives(program_name: &str, level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("{program_name}={level},shared_utils={level}")
}

/// Installs the global subscriber, then prunes old log files.
///
/// Errors when the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(program_name: &str, config: LogConfig) -> Result<()> {
    fs::create_dir_all(&config.directory).with_context(|| {
        format!("Cannot create log directory {}", config.directory.display())
    })?;

    let file_prefix = format!("{program_name}.log");
    let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, &file_prefix);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(program_name, config.level)));

    let file_sink = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_thread_names(true)
        .with_line_number(true);

    let stderr_sink = config.stderr_level.map(|level| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(LevelFilter::from_level(level))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_sink)
        .with(stderr_sink)
        .try_init()
        .context("tracing subscriber already installed")?;

    let pruned = prune_rotated_logs(&config.directory, program_name, config.retained_files)?;
    tracing::debug!(
        program = program_name,
        directory = %config.directory.display(),
        level = %config.level,
        pruned,
        "Logging initialized"
    );
    Ok(())
}

fn rotated_logs(directory: &Path, program_name: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
    let prefix = format!("{program_name}.log");
    let entries = fs::read_dir(directory)
        .with_context(|| format!("Cannot list log directory {}", directory.display()))?;

    Ok(entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            meta.is_file()
                .then(|| meta.modified().ok())
                .flatten()
                .map(|modified| (entry.path(), modified))
        })
        .collect())
}

/// Removes all but the `keep` most recently modified log files of
/// `program_name`. Returns how many were removed.
fn prune_rotated_logs(directory: &Path, program_name: &str, keep: usize) -> Result<usize> {
    let mut logs = rotated_logs(directory, program_name)?;
    logs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in logs.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot remove old log file"),
        }
    }
    Ok(removed)
}
