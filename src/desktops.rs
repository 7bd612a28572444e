//! Virtual desktops
//!
//! Four desktops share the screen. Switching hides the application windows
//! of the active desktop and shows the ones remembered for the target.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::error::{ShellError, ShellResult};
use crate::platform::{Platform, ShowCommand, TopLevelWindow, WindowHandle};

pub const DESKTOP_COUNT: usize = 4;

/// Show state to return a window to after minimize-all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Normal,
    Maximized,
}

/// Windows parked on one desktop
#[derive(Debug, Default, Clone)]
pub struct Desktop {
    pub windows: BTreeSet<WindowHandle>,
    pub foreground: Option<WindowHandle>,
    pub minimized: Vec<(WindowHandle, RestoreState)>,
}

#[derive(Debug, Default)]
pub struct Desktops {
    desktops: [Desktop; DESKTOP_COUNT],
    current: usize,
}

fn is_application(w: &TopLevelWindow, is_shell_window: &dyn Fn(WindowHandle) -> bool) -> bool {
    w.visible && !w.tool_window && !is_shell_window(w.handle)
}

impl Desktops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn desktop(&self, index: usize) -> Option<&Desktop> {
        self.desktops.get(index)
    }

    /// Make desktop `index` the active one
    pub fn switch_to(
        &mut self,
        index: usize,
        platform: &dyn Platform,
        is_shell_window: &dyn Fn(WindowHandle) -> bool,
    ) -> ShellResult<()> {
        if index >= DESKTOP_COUNT {
            return Err(ShellError::DesktopOutOfRange(index));
        }
        if index == self.current {
            return Ok(());
        }

        let claimed: BTreeSet<WindowHandle> = self
            .desktops
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.current)
            .flat_map(|(_, d)| d.windows.iter().copied())
            .collect();

        let visible: BTreeSet<WindowHandle> = platform
            .top_level_windows()
            .iter()
            .filter(|w| is_application(w, is_shell_window))
            .map(|w| w.handle)
            .filter(|h| !claimed.contains(h))
            .collect();

        let old = &mut self.desktops[self.current];
        old.foreground = platform.foreground_window().filter(|h| visible.contains(h));
        for &handle in &visible {
            platform.show_window(handle, ShowCommand::Hide);
        }
        debug!("Desktop {} parked {} windows", self.current, visible.len());
        old.windows = visible;

        let target = &mut self.desktops[index];
        for &handle in &target.windows {
            platform.show_window(handle, ShowCommand::ShowNoActivate);
        }
        if let Some(foreground) = target.foreground.take() {
            platform.set_foreground_window(foreground);
        }
        target.windows.clear();

        info!("Switched from desktop {} to {}", self.current, index);
        self.current = index;
        Ok(())
    }

    /// Minimize every application window, or restore the ones minimized by
    /// the previous call
    pub fn toggle_minimize(
        &mut self,
        platform: &dyn Platform,
        is_shell_window: &dyn Fn(WindowHandle) -> bool,
    ) {
        let desktop = &mut self.desktops[self.current];

        if desktop.minimized.is_empty() {
            for w in platform.top_level_windows() {
                if !is_application(&w, is_shell_window) || w.minimized {
                    continue;
                }
                let state = if w.maximized {
                    RestoreState::Maximized
                } else {
                    RestoreState::Normal
                };
                platform.show_window(w.handle, ShowCommand::Minimize);
                desktop.minimized.push((w.handle, state));
            }
            debug!("Minimized {} windows", desktop.minimized.len());
        } else {
            for (handle, state) in desktop.minimized.drain(..).rev() {
                let cmd = match state {
                    RestoreState::Maximized => ShowCommand::Maximize,
                    RestoreState::Normal => ShowCommand::Restore,
                };
                platform.show_window(handle, cmd);
            }
        }
    }
}
