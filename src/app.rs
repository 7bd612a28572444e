//! Main application logic for ShellBar

use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;

use crate::bar::desktop_bar::DesktopBar;
use crate::config::Config;
use crate::platform::win32::{Win32IconBackend, Win32Platform};
use crate::platform::{Platform, WindowHandle};
use crate::shell::Shell;

/// Main application state
pub struct Application {
    platform: Arc<Win32Platform>,
    shell: Arc<Shell>,
    bar: WindowHandle,
}

impl Application {
    /// Build the shell context and create the desktop bar
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Initializing ShellBar");

        let platform = Arc::new(Win32Platform::new().context("Failed to set up window classes")?);
        let icons = Arc::new(Win32IconBackend::new());
        let shell = Shell::new(platform.clone(), icons, config);

        let bar = DesktopBar::create(&shell).context("Failed to create the desktop bar")?;
        info!("Desktop bar created: {:?}", bar);

        Ok(Self {
            platform,
            shell,
            bar,
        })
    }

    /// Run the message loop until the bar is closed; returns the exit code
    pub fn run(&mut self) -> Result<i32> {
        info!("Starting ShellBar main loop");
        let code = self.platform.run_message_loop();
        info!("ShellBar main loop ended with code {}", code);
        Ok(code)
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if self.shell.owns_window(self.bar) {
            warn!("Desktop bar still alive at exit, destroying it");
            self.platform.destroy_window(self.bar);
        }
        self.shell.teardown();
    }
}
