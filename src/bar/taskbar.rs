//! Task bar: the running application windows

use std::any::Any;

use log::debug;

use crate::error::ShellResult;
use crate::platform::WindowHandle;
use crate::shell::Shell;
use crate::window::message::{PM_GET_LAST_ACTIVE, PM_REFRESH};
use crate::window::{route_default, Controller, Message, Reply};

pub const REFRESH_TIMER_ID: usize = 0;
const REFRESH_INTERVAL_MS: u32 = 2000;

pub struct TaskBar {
    hwnd: WindowHandle,
    windows: Vec<WindowHandle>,
    last_active: Option<WindowHandle>,
}

impl TaskBar {
    pub fn new(hwnd: WindowHandle) -> Self {
        Self {
            hwnd,
            windows: Vec::new(),
            last_active: None,
        }
    }

    /// Application windows currently shown as buttons
    pub fn windows(&self) -> &[WindowHandle] {
        &self.windows
    }

    pub fn last_active(&self) -> Option<WindowHandle> {
        self.last_active
    }

    /// Rescan the top-level windows
    pub fn refresh(&mut self, shell: &Shell) {
        let platform = shell.platform();
        self.windows = platform
            .top_level_windows()
            .into_iter()
            .filter(|w| w.visible && !w.tool_window && !shell.owns_window(w.handle))
            .map(|w| w.handle)
            .collect();

        if let Some(fg) = platform.foreground_window() {
            if self.windows.contains(&fg) {
                self.last_active = Some(fg);
            }
        }
        if let Some(last) = self.last_active {
            if !self.windows.contains(&last) {
                self.last_active = None;
            }
        }
        debug!("Task bar tracks {} windows", self.windows.len());
    }
}

impl Controller for TaskBar {
    fn on_create(&mut self, shell: &Shell) -> ShellResult<()> {
        self.refresh(shell);
        shell
            .platform()
            .set_timer(self.hwnd, REFRESH_TIMER_ID, REFRESH_INTERVAL_MS);
        Ok(())
    }

    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::Timer(REFRESH_TIMER_ID) | Message::App { id: PM_REFRESH, .. } => {
                self.refresh(shell);
                Reply::Handled(0)
            }
            Message::App {
                id: PM_GET_LAST_ACTIVE,
                ..
            } => Reply::Handled(self.last_active.map(|h| h.0).unwrap_or(0)),
            Message::Destroy => {
                shell.platform().kill_timer(self.hwnd, REFRESH_TIMER_ID);
                Reply::Default
            }
            _ => route_default(self, msg, shell),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
