//! ShellBar - a desktop shell for Windows
//!
//! Provides the desktop bar with start button, quick launch toolbar, task
//! list and notification area, plus a shared icon cache and virtual desktops.

#![cfg_attr(windows, windows_subsystem = "windows")]
#![cfg_attr(not(windows), allow(dead_code))]

#[cfg(windows)]
mod app;
mod bar;
mod config;
mod desktops;
mod error;
mod hotkey;
mod platform;
mod render;
mod shell;
mod utils;
mod window;

use anyhow::Result;
use log::info;

use crate::config::Config;

fn main() -> Result<()> {
    // The log level comes from the config, so it is loaded first
    let config = Config::load_or_default()?;

    env_logger::builder()
        .filter_level(config.general.level_filter())
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    info!("Starting ShellBar v{}", env!("CARGO_PKG_VERSION"));
    run(config)
}

#[cfg(windows)]
fn run(config: Config) -> Result<()> {
    use crate::app::Application;
    use std::sync::Arc;

    let mut app = Application::new(Arc::new(config))?;
    let code = app.run()?;
    drop(app);

    info!("ShellBar shutting down gracefully");
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: Config) -> Result<()> {
    anyhow::bail!("ShellBar replaces the Windows shell and only runs on Windows")
}
