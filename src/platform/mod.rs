//! Native platform seam
//!
//! Everything the shell needs from the operating system goes through the
//! [`Platform`] and [`IconBackend`] traits: window creation, message posting,
//! geometry, hotkeys, modal dialogs, icon extraction and raw drawing. The
//! Win32 implementation lives in [`win32`]; tests use the recording
//! implementation in `mock`.

#[cfg(test)]
pub mod mock;
#[cfg(windows)]
pub mod win32;

use std::sync::Weak;

use crate::error::ShellResult;
use crate::render::icons::IconId;
use crate::shell::Shell;
use crate::utils::{Rect, Size};
use crate::window::{Chain, Message};

/// Opaque native window handle. The OS owns the window; this is only its name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Address of a native window procedure replaced by subclassing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeProc(pub usize);

/// Native icon handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeIcon(pub isize);

/// Native bitmap handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBitmap(pub isize);

/// Native brush handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBrush(pub isize);

/// Native device context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceContext(pub isize);

/// Native image list (the shared system small-icon list)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageList(pub isize);

/// 0x00BBGGRR color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorRef(pub u32);

/// Background used when compositing icons without their own transparency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background {
    pub color: ColorRef,
    pub brush: Option<NativeBrush>,
}

/// Window classes the shell creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    DesktopBar,
    TaskBar,
    NotifyArea,
    StartMenu,
    /// Native toolbar control, subclassed after creation
    Toolbar,
    /// Native push button, subclassed after creation
    Button,
}

impl WindowClass {
    /// Registered class name (the bar keeps the name other programs look for)
    pub fn class_name(self) -> &'static str {
        match self {
            WindowClass::DesktopBar => "Shell_TrayWnd",
            WindowClass::TaskBar => "MSTaskSwWClass",
            WindowClass::NotifyArea => "TrayNotifyWnd",
            WindowClass::StartMenu => "ShellBarStartMenu",
            WindowClass::Toolbar => "ToolbarWindow32",
            WindowClass::Button => "BUTTON",
        }
    }
}

/// Parameters for creating a window
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub class: WindowClass,
    pub title: String,
    pub rect: Rect,
    pub parent: Option<WindowHandle>,
    pub id: u32,
    pub visible: bool,
}

impl WindowSpec {
    pub fn new(class: WindowClass, title: impl Into<String>, rect: Rect) -> Self {
        Self {
            class,
            title: title.into(),
            rect,
            parent: None,
            id: 0,
            visible: true,
        }
    }

    pub fn child_of(mut self, parent: WindowHandle, id: u32) -> Self {
        self.parent = Some(parent);
        self.id = id;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// One window move in a batched layout update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub handle: WindowHandle,
    pub rect: Rect,
}

/// Show state requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Hide,
    Show,
    ShowNoActivate,
    Minimize,
    Maximize,
    Restore,
}

/// Snapshot of a top-level window as seen by desktop switching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopLevelWindow {
    pub handle: WindowHandle,
    pub visible: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub tool_window: bool,
}

/// Administrative policies the shell honors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    NoTrayItemsDisplay,
}

/// Toolbar button description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub id: u32,
    pub bitmap: Option<NativeBitmap>,
    pub text: String,
    pub pressed: bool,
    pub separator: bool,
}

impl ToolbarButton {
    pub fn separator() -> Self {
        Self {
            id: 0,
            bitmap: None,
            text: String::new(),
            pressed: false,
            separator: true,
        }
    }
}

/// Icon source reported for a file by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    /// Index into the shared system image list
    SysIndex(ImageList, i32),
    /// Icon handle owned by the caller
    Icon(NativeIcon),
}

/// Operating system services used by the shell core
pub trait Platform: Send + Sync {
    /// Route native messages for shell windows to `shell`
    fn attach(&self, shell: Weak<Shell>);

    /// Create a window. For shell classes this dispatches the creation
    /// messages synchronously before returning.
    fn create_window(&self, spec: &WindowSpec) -> ShellResult<WindowHandle>;
    fn destroy_window(&self, handle: WindowHandle);

    /// Interpose the shell window procedure, returning the replaced one
    fn subclass(&self, handle: WindowHandle) -> ShellResult<NativeProc>;
    fn restore_proc(&self, handle: WindowHandle, original: NativeProc);

    fn post_message(&self, handle: WindowHandle, msg: &Message) -> bool;
    /// Synchronous send to a window the shell does not control
    fn send_native(&self, handle: WindowHandle, msg: &Message) -> isize;
    /// Run the default or replaced procedure for a message a controller
    /// left unhandled
    fn call_chain(&self, handle: WindowHandle, chain: Chain, msg: &Message) -> isize;
    fn broadcast(&self, message_id: u32, wparam: usize);
    fn register_window_message(&self, name: &str) -> u32;

    fn screen_size(&self) -> Size;
    fn work_area(&self) -> Option<Rect>;
    /// Change the work area without notifying other windows; callers
    /// broadcast the change themselves
    fn set_work_area(&self, area: Rect) -> bool;
    fn window_rect(&self, handle: WindowHandle) -> Rect;
    fn client_size(&self, handle: WindowHandle) -> Size;
    /// Move all windows in one atomic update
    fn apply_layout(&self, placements: &[Placement]) -> ShellResult<()>;
    fn show_window(&self, handle: WindowHandle, cmd: ShowCommand);
    fn set_timer(&self, handle: WindowHandle, id: usize, interval_ms: u32);
    fn kill_timer(&self, handle: WindowHandle, id: usize);

    fn register_hotkey(&self, handle: WindowHandle, id: i32, modifiers: u32, key: u32) -> bool;
    fn unregister_hotkey(&self, handle: WindowHandle, id: i32);

    fn top_level_windows(&self) -> Vec<TopLevelWindow>;
    fn foreground_window(&self) -> Option<WindowHandle>;
    fn set_foreground_window(&self, handle: WindowHandle);

    /// Modal exit confirmation; `true` means the user confirmed
    fn confirm_exit(&self, owner: WindowHandle) -> bool;
    fn show_about(&self, owner: WindowHandle);
    fn show_settings(&self, owner: WindowHandle);
    /// Modal popup menu at a screen position; returns the chosen command id
    fn track_popup_menu(&self, owner: WindowHandle, items: &[(u32, &str)], x: i32, y: i32)
        -> Option<u32>;
    /// Answer a tooltip text request; `header` is the address carried by
    /// the notification
    fn set_tooltip_text(&self, header: isize, text: &str);
    fn launch(&self, target: &str) -> ShellResult<()>;
    fn is_restricted(&self, restriction: Restriction) -> bool;
    fn text_width(&self, handle: WindowHandle, text: &str) -> i32;

    fn toolbar_add_buttons(&self, toolbar: WindowHandle, buttons: &[ToolbarButton]);
    fn toolbar_set_pressed(&self, toolbar: WindowHandle, id: u32, pressed: bool);
    /// Uniform button width, 0 if the toolbar cannot tell
    fn toolbar_button_width(&self, toolbar: WindowHandle) -> i32;
    fn toolbar_clear(&self, toolbar: WindowHandle);

    /// Leave the message loop
    fn quit(&self, code: i32);
}

/// Icon extraction and drawing services
pub trait IconBackend: Send + Sync {
    /// Icon associated with a file or its file type
    fn file_icon(&self, path: &str) -> Option<FileIcon>;
    /// Icon number `index` embedded in a file (exe, dll, ico)
    fn indexed_icon(&self, path: &str, index: i32) -> Option<NativeIcon>;
    /// Stock shell icon for a well-known id
    fn stock_icon(&self, id: IconId) -> Option<NativeIcon>;
    fn destroy_icon(&self, icon: NativeIcon);
    fn destroy_bitmap(&self, bitmap: NativeBitmap);

    fn fill_background(&self, dc: DeviceContext, rect: Rect, background: Background);
    fn draw_icon(&self, dc: DeviceContext, icon: NativeIcon, rect: Rect, background: Background);
    fn draw_image_list(
        &self,
        dc: DeviceContext,
        list: ImageList,
        index: i32,
        rect: Rect,
        background: Background,
    );
    fn bitmap_from_icon(
        &self,
        icon: NativeIcon,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap>;
    fn bitmap_from_image_list(
        &self,
        list: ImageList,
        index: i32,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap>;
}
