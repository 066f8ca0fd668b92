//! Tracing setup: a detailed log file plus a quiet console.
//!
//! The file layer records everything the verbosity allows to
//! `<logs>/run.log`; the console only shows warnings and errors so the
//! progress spinner and result lines stay readable. Run failures are left to
//! the command's own error line.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::Level;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::commands::LogFormat;

/// Rotate once the log grows past this size.
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
/// Rotated files kept as `run.log.1` .. `run.log.5`.
const BACKUP_COUNT: usize = 5;

/// Open log file for the lifetime of the process. Flushes on drop.
pub(crate) struct LogHandle {
    path: PathBuf,
    file: File,
}

impl LogHandle {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogHandle {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

/// Whether an event reaches the console layer.
pub(crate) fn console_accepts(level: &Level, target: &str) -> bool {
    *level <= Level::WARN && target != cvassist_core::FAILURE_TARGET
}

/// Filter directive for the file layer.
pub(crate) fn file_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "cvassist=info",
        1 => "cvassist=debug",
        _ => "cvassist=trace",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flags.
pub(crate) fn init(log_file: &Path, verbose: u8, format: LogFormat) -> Result<LogHandle> {
    rotate(log_file, MAX_LOG_BYTES, BACKUP_COUNT)
        .wrap_err_with(|| format!("rotating {}", log_file.display()))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .wrap_err_with(|| format!("opening log file {}", log_file.display()))?;
    let writer = || -> Result<Mutex<File>> {
        Ok(Mutex::new(file.try_clone().wrap_err("cloning log file handle")?))
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(file_directive(verbose)));

    let file_layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer()?)
            .with_ansi(false)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer()?).boxed(),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(filter_fn(|meta| console_accepts(meta.level(), meta.target())));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(env_filter))
        .with(console_layer)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))?;

    Ok(LogHandle {
        path: log_file.to_path_buf(),
        file,
    })
}

/// Shift `path` to `path.1` (and older backups up by one) when it is larger
/// than `max_bytes`. The oldest backup beyond `keep` is removed.
pub(crate) fn rotate(path: &Path, max_bytes: u64, keep: usize) -> std::io::Result<()> {
    let Ok(meta) = std::fs::metadata(path) else {
        return Ok(());
    };
    if meta.len() <= max_bytes {
        return Ok(());
    }
    if keep == 0 {
        return std::fs::remove_file(path);
    }

    let backup = |n: usize| {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    };

    let oldest = backup(keep);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for n in (1..keep).rev() {
        let from = backup(n);
        if from.exists() {
            std::fs::rename(&from, backup(n + 1))?;
        }
    }
    std::fs::rename(path, backup(1))
}
