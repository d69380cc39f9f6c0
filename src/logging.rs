use crate::app::AppResult;
use color_eyre::eyre::WrapErr;
use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Routes tracing output to a file, since the terminal belongs to the UI.
/// Returns the path that was written to.
pub fn init(log_file: Option<&Path>) -> AppResult<PathBuf> {
    let (file, path) = match log_file {
        Some(path) => (open_append(path)?, path.to_path_buf()),
        None => tempfile::Builder::new()
            .prefix("dapp-tui-")
            .suffix(".log")
            .tempfile()
            .wrap_err("failed to create log file")?
            .keep()
            .wrap_err("failed to keep log file")?,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;
    Ok(path)
}

fn open_append(path: &Path) -> AppResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))
}
