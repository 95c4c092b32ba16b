use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use ut_core::Verbosity;

use crate::{map_cli_log_open, CliError};

pub(crate) enum LogTarget<'a> {
    Stderr,
    /// The terminal belongs to the UI, so logs go to a file.
    File(&'a str),
}

pub(crate) fn filter_directive(level: Verbosity) -> &'static str {
    match level {
        Verbosity::Error => "error",
        Verbosity::Warning => "warn",
        Verbosity::Info => "info",
        Verbosity::Debug => "debug",
    }
}

/// Installs the process subscriber. `RUST_LOG` wins over `level`; a second
/// call keeps the first subscriber.
pub(crate) fn init_tracing(level: Verbosity, target: LogTarget<'_>) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogTarget::File(path) => {
            let file = open_log_file(Path::new(path))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
    }
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File, CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_log_open)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(map_cli_log_open)
}
