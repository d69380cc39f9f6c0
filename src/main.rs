mod app;
mod chain;
mod components;
mod config;
mod logging;
mod protocol;
mod storage;
mod ui;

use clap::Parser;
use color_eyre::Result;
use tracing::info;

fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = config::Args::parse().into_settings()?;
    let log_path = logging::init(settings.log_file.as_deref())?;
    eprintln!("logging to {}", log_path.display());
    info!(rpc_url = %settings.rpc_url, logged_in = settings.signing_key.is_some(), "starting");

    // Connect before touching the terminal so failures print normally.
    let app = app::App::new(settings)?;
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}
