//! Desktop bar
//!
//! The top-level shell window. It creates and lays out the start button,
//! quick launch bar, task bar and notification area, reserves its strip of
//! the screen, owns the global hotkeys, routes commands and relays tray
//! notifications from other programs.

use std::any::Any;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::BarPosition;
use crate::error::ShellResult;
use crate::hotkey::{register_default_hotkeys, HotkeyAction, HotkeyManager};
use crate::platform::{Placement, Platform, Restriction, WindowClass, WindowHandle, WindowSpec};
use crate::shell::Shell;
use crate::utils::{Rect, Size};
use crate::window::message::{
    desktop_switch_index, COPYDATA_TRAY_NOTIFY, IDC_START, IDW_TASKBAR, IDW_TRAYNOTIFY,
    ID_ABOUT_EXPLORER, ID_DESKTOPBAR_SETTINGS, ID_EXPLORE, ID_MINIMIZE_ALL, ID_TASKMGR,
    PM_GET_LAST_ACTIVE, PM_GET_WIDTH, PM_RESIZE_CHILDREN, PM_UPDATE_DESKTOP, SC_TASKLIST,
    SPI_SETWORKAREA, TTN_GETDISPINFO, WM_SETTINGCHANGE,
};
use crate::window::{route_default, Controller, Message, Reply};

use super::layout::{compute_layout, LayoutInput};
use super::notify_area::NotifyArea;
use super::quicklaunch::QuickLaunchBar;
use super::start_menu::{StartButton, StartMenu};
use super::taskbar::TaskBar;
use super::tray_data::TrayNotification;

/// Entries of the bar's context menu
const CONTEXT_MENU: [(u32, &str); 3] = [
    (ID_DESKTOPBAR_SETTINGS, "&Settings..."),
    (ID_TASKMGR, "&Task Manager..."),
    (ID_ABOUT_EXPLORER, "&About ShellBar..."),
];

/// Lifecycle of the bar window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarState {
    Uninitialized,
    Created,
    Active,
    Closing,
    Destroyed,
}

pub struct DesktopBar {
    hwnd: WindowHandle,
    state: BarState,
    platform: Arc<dyn Platform>,
    start_button: Option<WindowHandle>,
    taskbar: Option<WindowHandle>,
    notify_area: Option<WindowHandle>,
    quick_launch: Option<WindowHandle>,
    start_menu: Option<WindowHandle>,
    hotkeys: HotkeyManager,
    /// Work area found at startup; taken when restored
    saved_work_area: Option<Rect>,
}

impl DesktopBar {
    pub fn new(hwnd: WindowHandle, shell: &Shell) -> Self {
        Self {
            hwnd,
            state: BarState::Uninitialized,
            platform: shell.platform.clone(),
            start_button: None,
            taskbar: None,
            notify_area: None,
            quick_launch: None,
            start_menu: None,
            hotkeys: HotkeyManager::new(hwnd),
            saved_work_area: shell.platform().work_area(),
        }
    }

    /// Create the bar docked to the configured screen edge
    pub fn create(shell: &Shell) -> ShellResult<WindowHandle> {
        let screen = shell.platform().screen_size();
        let bar = &shell.config().bar;
        let y = match bar.position {
            BarPosition::Bottom => screen.height - bar.height,
            BarPosition::Top => 0,
        };
        let spec = WindowSpec::new(
            WindowClass::DesktopBar,
            "",
            Rect::new(0, y, screen.width, bar.height),
        );
        shell.create_window(&spec, DesktopBar::new)
    }

    pub fn state(&self) -> BarState {
        self.state
    }

    pub fn taskbar(&self) -> Option<WindowHandle> {
        self.taskbar
    }

    pub fn notify_area(&self) -> Option<WindowHandle> {
        self.notify_area
    }

    pub fn quick_launch(&self) -> Option<WindowHandle> {
        self.quick_launch
    }

    pub fn start_button(&self) -> Option<WindowHandle> {
        self.start_button
    }

    pub fn start_menu(&self) -> Option<WindowHandle> {
        self.start_menu
    }

    fn child_spec(&self, class: WindowClass, id: u32) -> WindowSpec {
        WindowSpec::new(class, "", Rect::default()).child_of(self.hwnd, id)
    }

    fn create_children(&mut self, shell: &Shell) -> ShellResult<()> {
        let platform = shell.platform();

        let button_spec = WindowSpec::new(
            WindowClass::Button,
            shell.config().bar.start_label.clone(),
            Rect::default(),
        )
        .child_of(self.hwnd, IDC_START);
        let button = platform.create_window(&button_spec)?;
        shell.subclass(button, StartButton::new(button, shell))?;
        self.start_button = Some(button);

        self.taskbar = Some(shell.create_window(
            &self.child_spec(WindowClass::TaskBar, IDW_TASKBAR),
            |h, _| TaskBar::new(h),
        )?);

        if shell.config().notify.respect_restrictions
            && platform.is_restricted(Restriction::NoTrayItemsDisplay)
        {
            info!("Tray items are disabled by policy, no notification area");
        } else {
            self.notify_area = Some(shell.create_window(
                &self.child_spec(WindowClass::NotifyArea, IDW_TRAYNOTIFY),
                NotifyArea::new,
            )?);
        }

        match QuickLaunchBar::create(shell, self.hwnd) {
            Ok(handle) => self.quick_launch = Some(handle),
            Err(e) => warn!("Quick launch bar unavailable: {}", e),
        }

        let owner = self.hwnd;
        self.start_menu = Some(shell.create_window(
            &self.child_spec(WindowClass::StartMenu, 0).hidden(),
            move |h, _| StartMenu::new(h, owner),
        )?);
        Ok(())
    }

    fn preferred_width(shell: &Shell, child: Option<WindowHandle>) -> i32 {
        child
            .map(|h| shell.send(h, &Message::app(PM_GET_WIDTH, 0)) as i32)
            .unwrap_or(0)
    }

    /// Place all children for a client area of `size`
    fn resize_children(&self, shell: &Shell, size: Size) {
        let layout = compute_layout(LayoutInput {
            width: size.width,
            height: size.height,
            start_width: Self::preferred_width(shell, self.start_button),
            quick_launch_width: Self::preferred_width(shell, self.quick_launch),
            notify_width: Self::preferred_width(shell, self.notify_area),
        });

        let placements: Vec<Placement> = [
            (self.start_button, layout.start_button),
            (self.quick_launch, layout.quick_launch),
            (self.taskbar, layout.taskbar),
            (self.notify_area, layout.notify_area),
        ]
        .into_iter()
        .filter_map(|(handle, rect)| handle.map(|handle| Placement { handle, rect }))
        .collect();

        if let Err(e) = shell.platform().apply_layout(&placements) {
            warn!("Bar layout failed: {}", e);
        }
    }

    /// Keep maximized windows out of the bar's strip
    fn reserve_work_area(&self, shell: &Shell) {
        if !shell.config().behavior.reserve_work_area {
            return;
        }
        let platform = shell.platform();
        let screen = platform.screen_size();
        let bar = platform.window_rect(self.hwnd);
        let area = match shell.config().bar.position {
            BarPosition::Bottom => Rect::from_edges(0, 0, screen.width, bar.y),
            BarPosition::Top => Rect::from_edges(0, bar.bottom(), screen.width, screen.height),
        };
        if platform.set_work_area(area) {
            platform.broadcast(WM_SETTINGCHANGE, SPI_SETWORKAREA);
        } else {
            warn!("Cannot reserve work area {:?}", area);
        }
    }

    fn restore_work_area(&mut self) {
        if let Some(area) = self.saved_work_area.take() {
            self.platform.set_work_area(area);
            self.platform.broadcast(WM_SETTINGCHANGE, SPI_SETWORKAREA);
            debug!("Work area restored to {:?}", area);
        }
    }

    fn toggle_start_menu(&self, shell: &Shell) {
        if let Some(menu) = self.start_menu {
            shell.with_controller::<StartMenu, _>(menu, |m| m.toggle(shell));
        }
    }

    fn explore(&self, shell: &Shell) {
        if let Err(e) = shell.platform().launch(&shell.config().general.explorer_command) {
            warn!("Cannot open the file manager: {}", e);
        }
    }

    fn minimize_all(&self, shell: &Shell) {
        shell
            .desktops()
            .toggle_minimize(shell.platform(), &|h| shell.owns_window(h));
    }

    fn switch_desktop(&self, shell: &Shell, index: usize) {
        let result = shell
            .desktops()
            .switch_to(index, shell.platform(), &|h| shell.owns_window(h));
        match result {
            Ok(()) => {
                if let Some(quick_launch) = self.quick_launch {
                    shell.post(quick_launch, &Message::app(PM_UPDATE_DESKTOP, index));
                }
            }
            Err(e) => warn!("Desktop switch rejected: {}", e),
        }
    }

    fn on_hotkey(&self, shell: &Shell, id: i32) -> Reply {
        match self.hotkeys.action(id) {
            Some(HotkeyAction::ShowExplorer) => self.explore(shell),
            Some(HotkeyAction::ToggleStartMenu) => self.toggle_start_menu(shell),
            Some(HotkeyAction::MinimizeAll) => self.minimize_all(shell),
            Some(HotkeyAction::SwitchDesktop(index)) => self.switch_desktop(shell, index),
            None => return Reply::Default,
        }
        Reply::Handled(0)
    }

    fn on_close(&mut self, shell: &Shell) -> Reply {
        if self.state != BarState::Active {
            return Reply::Handled(0);
        }
        self.state = BarState::Closing;

        let confirmed =
            !shell.config().behavior.confirm_exit || shell.platform().confirm_exit(self.hwnd);
        if confirmed {
            info!("Desktop bar closing");
            // the default procedure destroys the window
            Reply::Default
        } else {
            self.state = BarState::Active;
            Reply::Handled(0)
        }
    }

    fn on_destroy(&mut self, shell: &Shell) {
        self.hotkeys.unregister_all(shell.platform());
        self.restore_work_area();
        shell.platform().quit(0);
        self.state = BarState::Destroyed;
        info!("Desktop bar destroyed");
    }

    /// Show the bar menu at a screen point and run the chosen command.
    /// Keyboard requests carry a point outside the bar and open at its corner.
    fn show_context_menu(&mut self, shell: &Shell, x: i32, y: i32) {
        let bar = shell.platform().window_rect(self.hwnd);
        let (x, y) = if bar.contains(x, y) { (x, y) } else { (bar.x, bar.y) };
        if let Some(id) = shell
            .platform()
            .track_popup_menu(self.hwnd, &CONTEXT_MENU, x, y)
        {
            debug!("Context menu chose {}", id);
            self.command(id, 0, shell);
        }
    }

    /// Handle a copy-data block; true if a tray request was applied
    fn relay_copy_data(&self, shell: &Shell, tag: usize, payload: &[u8]) -> bool {
        if tag != COPYDATA_TRAY_NOTIFY {
            debug!("Ignoring copy data with tag {}", tag);
            return false;
        }
        let Some(area) = self.notify_area else {
            return false;
        };
        let notification = match TrayNotification::parse(payload) {
            Ok(n) => n,
            Err(e) => {
                debug!("Skipping tray data: {}", e);
                return false;
            }
        };

        let accepted = shell
            .with_controller::<NotifyArea, _>(area, |n| n.process_tray_notification(&notification))
            .unwrap_or(false);
        if accepted {
            self.resize_children(shell, shell.platform().client_size(self.hwnd));
        }
        accepted
    }
}

impl Controller for DesktopBar {
    fn on_create(&mut self, shell: &Shell) -> ShellResult<()> {
        self.state = BarState::Created;
        self.create_children(shell)?;

        register_default_hotkeys(&mut self.hotkeys, shell.platform(), &shell.config().hotkeys);
        if shell.config().behavior.broadcast_taskbar_created {
            shell.platform().broadcast(shell.taskbar_created_message(), 0);
        }

        self.state = BarState::Active;
        info!("Desktop bar active");
        Ok(())
    }

    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::Size { width, height } => {
                self.resize_children(shell, Size::new(*width, *height));
                self.reserve_work_area(shell);
                Reply::Handled(0)
            }
            Message::App {
                id: PM_RESIZE_CHILDREN,
                ..
            } => {
                self.resize_children(shell, shell.platform().client_size(self.hwnd));
                Reply::Handled(0)
            }
            Message::App {
                id: PM_GET_LAST_ACTIVE,
                ..
            } => match self.taskbar {
                Some(taskbar) => Reply::Handled(shell.send(taskbar, msg)),
                None => Reply::Handled(0),
            },
            Message::Close => self.on_close(shell),
            Message::Destroy => {
                self.on_destroy(shell);
                Reply::Handled(0)
            }
            Message::Hotkey(id) => self.on_hotkey(shell, *id),
            Message::SysCommand(SC_TASKLIST) => {
                self.toggle_start_menu(shell);
                Reply::Handled(0)
            }
            Message::CopyData { tag, payload } => {
                Reply::Handled(self.relay_copy_data(shell, *tag, payload) as isize)
            }
            Message::ContextMenu { x, y } => {
                self.show_context_menu(shell, *x, *y);
                Reply::Handled(0)
            }
            _ => route_default(self, msg, shell),
        }
    }

    fn command(&mut self, id: u32, code: u32, shell: &Shell) -> Reply {
        match id {
            IDC_START => self.toggle_start_menu(shell),
            ID_ABOUT_EXPLORER => shell.platform().show_about(self.hwnd),
            ID_DESKTOPBAR_SETTINGS => shell.platform().show_settings(self.hwnd),
            ID_MINIMIZE_ALL => self.minimize_all(shell),
            ID_EXPLORE => self.explore(shell),
            ID_TASKMGR => {
                if let Err(e) = shell.platform().launch(&shell.config().general.taskmgr_command) {
                    warn!("Cannot start the task manager: {}", e);
                }
            }
            _ => {
                if let Some(index) = desktop_switch_index(id) {
                    self.switch_desktop(shell, index);
                } else {
                    return match self.quick_launch {
                        Some(quick_launch) => {
                            Reply::Handled(shell.send(quick_launch, &Message::Command { id, code }))
                        }
                        None => Reply::Handled(1),
                    };
                }
            }
        }
        Reply::Handled(0)
    }

    /// Toolbar tooltips ask the bar, their parent; the quick launch bar
    /// knows the titles
    fn notify(&mut self, id: u32, code: i32, header: isize, shell: &Shell) -> Reply {
        match (code, self.quick_launch) {
            (TTN_GETDISPINFO, Some(quick_launch)) => {
                Reply::Handled(shell.send(quick_launch, &Message::Notify { id, code, header }))
            }
            _ => Reply::Default,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for DesktopBar {
    fn drop(&mut self) {
        if self.saved_work_area.is_some() {
            warn!("Desktop bar dropped without destroy, restoring work area");
            self.restore_work_area();
        }
    }
}
