//! Notification area (tray icons)

use std::any::Any;

use log::{debug, info};

use crate::platform::{NativeIcon, WindowHandle};
use crate::shell::Shell;
use crate::window::message::PM_GET_WIDTH;
use crate::window::{route_default, Controller, Message, Reply};

use super::tray_data::{
    NotifyIconData, TrayNotification, NIF_ICON, NIF_MESSAGE, NIF_STATE, NIF_TIP, NIM_ADD,
    NIM_DELETE, NIM_MODIFY, NIM_SETFOCUS, NIM_SETVERSION,
};

/// Space left and right of the icon row
pub const NOTIFY_PADDING: i32 = 3;

/// One tray icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyIconEntry {
    pub owner: WindowHandle,
    pub uid: u32,
    pub flags: u32,
    pub callback_message: u32,
    pub icon: NativeIcon,
    pub tip: String,
    pub state: u32,
    pub version: u32,
}

impl NotifyIconEntry {
    fn from_data(data: &NotifyIconData) -> Self {
        let mut entry = Self {
            owner: data.owner,
            uid: data.uid,
            flags: 0,
            callback_message: 0,
            icon: NativeIcon(0),
            tip: String::new(),
            state: 0,
            version: 0,
        };
        entry.apply(data);
        entry
    }

    /// Copy the fields the request marks as valid
    fn apply(&mut self, data: &NotifyIconData) {
        self.flags |= data.flags;
        if data.flags & NIF_MESSAGE != 0 {
            self.callback_message = data.callback_message;
        }
        if data.flags & NIF_ICON != 0 {
            self.icon = data.icon;
        }
        if data.flags & NIF_TIP != 0 {
            self.tip = data.tip.clone();
        }
        if data.flags & NIF_STATE != 0 {
            self.state = (self.state & !data.state_mask) | (data.state & data.state_mask);
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.state & super::tray_data::NIS_HIDDEN != 0
    }
}

pub struct NotifyArea {
    hwnd: WindowHandle,
    icons: Vec<NotifyIconEntry>,
    icon_spacing: i32,
    min_width: i32,
}

impl NotifyArea {
    pub fn new(hwnd: WindowHandle, shell: &Shell) -> Self {
        let config = &shell.config().notify;
        Self {
            hwnd,
            icons: Vec::new(),
            icon_spacing: config.icon_spacing,
            min_width: config.min_width,
        }
    }

    pub fn icons(&self) -> &[NotifyIconEntry] {
        &self.icons
    }

    fn position(&self, owner: WindowHandle, uid: u32) -> Option<usize> {
        self.icons
            .iter()
            .position(|e| e.owner == owner && e.uid == uid)
    }

    /// Apply a tray request; returns whether it was accepted
    pub fn process_tray_notification(&mut self, n: &TrayNotification) -> bool {
        let data = &n.data;
        let existing = self.position(data.owner, data.uid);

        let accepted = match (n.message, existing) {
            (NIM_ADD, None) => {
                self.icons.push(NotifyIconEntry::from_data(data));
                true
            }
            (NIM_MODIFY, Some(i)) => {
                self.icons[i].apply(data);
                true
            }
            (NIM_DELETE, Some(i)) => {
                self.icons.remove(i);
                true
            }
            (NIM_SETFOCUS, Some(_)) => true,
            (NIM_SETVERSION, Some(i)) => {
                self.icons[i].version = data.timeout_or_version;
                true
            }
            _ => false,
        };

        debug!(
            "Tray request {} for ({:?}, {}) {}",
            n.message,
            data.owner,
            data.uid,
            if accepted { "accepted" } else { "rejected" }
        );
        accepted
    }

    pub fn visible_count(&self) -> usize {
        self.icons.iter().filter(|e| !e.is_hidden()).count()
    }

    /// Preferred width for the bar layout
    pub fn width(&self) -> i32 {
        let width = self.visible_count() as i32 * self.icon_spacing + 2 * NOTIFY_PADDING;
        width.max(self.min_width)
    }
}

impl Controller for NotifyArea {
    fn on_create(&mut self, _shell: &Shell) -> crate::error::ShellResult<()> {
        info!("Notification area created ({:?})", self.hwnd);
        Ok(())
    }

    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::App { id: PM_GET_WIDTH, .. } => Reply::Handled(self.width() as isize),
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
