//! Start button and start menu popup

use std::any::Any;

use log::debug;

use crate::config::BarPosition;
use crate::platform::{Placement, ShowCommand, WindowHandle};
use crate::shell::Shell;
use crate::utils::Rect;
use crate::window::message::PM_GET_WIDTH;
use crate::window::{route_default, Controller, Message, Reply};

pub const START_MENU_WIDTH: i32 = 220;
pub const START_MENU_HEIGHT: i32 = 320;
/// Room for the small icon drawn left of the caption
const START_ICON_WIDTH: i32 = 16;

/// Subclassed push button that reports its preferred width
pub struct StartButton {
    width: i32,
}

impl StartButton {
    pub fn new(hwnd: WindowHandle, shell: &Shell) -> Self {
        let bar = &shell.config().bar;
        let text = shell.platform().text_width(hwnd, &bar.start_label);
        Self {
            width: text + START_ICON_WIDTH + 2 * bar.start_button_padding,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }
}

impl Controller for StartButton {
    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::App { id: PM_GET_WIDTH, .. } => Reply::Handled(self.width as isize),
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

/// Popup menu opened from the start button; created hidden
pub struct StartMenu {
    hwnd: WindowHandle,
    /// Bar the menu opens against
    owner: WindowHandle,
    visible: bool,
}

impl StartMenu {
    pub fn new(hwnd: WindowHandle, owner: WindowHandle) -> Self {
        Self {
            hwnd,
            owner,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Open the menu next to the bar, or close it if open
    pub fn toggle(&mut self, shell: &Shell) {
        if self.visible {
            self.hide(shell);
        } else {
            self.show(shell);
        }
    }

    fn show(&mut self, shell: &Shell) {
        let platform = shell.platform();
        let bar = platform.window_rect(self.owner);
        let y = match shell.config().bar.position {
            BarPosition::Bottom => bar.y - START_MENU_HEIGHT,
            BarPosition::Top => bar.bottom(),
        };
        let rect = Rect::new(bar.x, y, START_MENU_WIDTH, START_MENU_HEIGHT);
        if let Err(e) = platform.apply_layout(&[Placement {
            handle: self.hwnd,
            rect,
        }]) {
            debug!("Start menu placement failed: {}", e);
        }
        platform.show_window(self.hwnd, ShowCommand::Show);
        self.visible = true;
    }

    fn hide(&mut self, shell: &Shell) {
        shell.platform().show_window(self.hwnd, ShowCommand::Hide);
        self.visible = false;
    }
}

impl Controller for StartMenu {
    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::Close => {
                self.hide(shell);
                Reply::Handled(0)
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
