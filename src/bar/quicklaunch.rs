//! Quick launch toolbar
//!
//! A native toolbar subclassed by the shell. It offers fixed buttons
//! (minimize all, explore, one per desktop) followed by one button per
//! shortcut found in the quick launch folder.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::desktops::DESKTOP_COUNT;
use crate::error::ShellResult;
use crate::platform::{
    Background, ColorRef, DeviceContext, IconBackend, NativeBitmap, ToolbarButton, WindowClass,
    WindowHandle, WindowSpec,
};
use crate::render::icons::{Icon, IconId};
use crate::shell::Shell;
use crate::utils::Rect;
use crate::window::message::{
    is_quick_launch_id, IDC_FIRST_QUICK_ID, IDW_QUICKLAUNCHBAR, ID_EXPLORE, ID_MINIMIZE_ALL,
    ID_SWITCH_DESKTOP_1, PM_GET_WIDTH, PM_REFRESH, PM_RESIZE_CHILDREN, PM_UPDATE_DESKTOP,
    TTN_GETDISPINFO,
};
use crate::window::{route_default, Controller, Message, Reply};

/// Button face color used behind converted icons
const BUTTON_FACE: ColorRef = ColorRef(0x00F0_F0F0);

/// Shell item a button launches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellEntry {
    pub path: PathBuf,
}

/// One toolbar button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickLaunchEntry {
    pub bitmap: Option<NativeBitmap>,
    pub title: String,
    pub entry: Option<ShellEntry>,
}

pub struct QuickLaunchBar {
    hwnd: WindowHandle,
    parent: WindowHandle,
    /// Owner of the button bitmaps
    backend: Arc<dyn IconBackend>,
    entries: BTreeMap<u32, QuickLaunchEntry>,
    next_id: u32,
    button_distance: i32,
}

/// Shortcut files of `folder`, sorted by name; hidden files and
/// directories are skipped
pub fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && !is_hidden(e))
        .map(|e| e.into_path())
        .collect()
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
        if let Ok(meta) = entry.metadata() {
            return meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0;
        }
    }
    false
}

impl QuickLaunchBar {
    /// Create the toolbar inside `parent`, fill it, and subclass it
    pub fn create(shell: &Shell, parent: WindowHandle) -> ShellResult<WindowHandle> {
        let spec = WindowSpec::new(WindowClass::Toolbar, "Quick Launch", Rect::default())
            .child_of(parent, IDW_QUICKLAUNCHBAR);
        let hwnd = shell.platform().create_window(&spec)?;

        let mut bar = QuickLaunchBar {
            hwnd,
            parent,
            backend: shell.icons().backend(),
            entries: BTreeMap::new(),
            next_id: IDC_FIRST_QUICK_ID,
            button_distance: shell.config().quick_launch.button_distance,
        };
        bar.populate(shell);

        if let Err(e) = shell.subclass(hwnd, bar) {
            shell.platform().destroy_window(hwnd);
            return Err(e);
        }
        shell.post(parent, &Message::app(PM_RESIZE_CHILDREN, 0));
        Ok(hwnd)
    }

    /// Drop all buttons and build them again from the folder
    pub fn refresh(&mut self, shell: &Shell) {
        shell.platform().toolbar_clear(self.hwnd);
        self.release_bitmaps();
        self.entries.clear();
        self.next_id = IDC_FIRST_QUICK_ID;
        self.populate(shell);
        shell.post(self.parent, &Message::app(PM_RESIZE_CHILDREN, 0));
    }

    fn release_bitmaps(&mut self) {
        for bitmap in self.entries.values_mut().filter_map(|e| e.bitmap.take()) {
            self.backend.destroy_bitmap(bitmap);
        }
    }

    fn populate(&mut self, shell: &Shell) {
        let platform = shell.platform();
        let mut buttons = Vec::new();

        let explorer = shell.icons().get_icon(IconId::EXPLORER);
        let apps = shell.icons().get_icon(IconId::APPS);
        buttons.push(self.add_fixed(shell, ID_MINIMIZE_ALL, "Minimize all", &apps));
        buttons.push(self.add_fixed(shell, ID_EXPLORE, "Explore", &explorer));
        buttons.push(ToolbarButton::separator());

        let current = shell.desktops().current();
        for i in 0..DESKTOP_COUNT {
            let id = ID_SWITCH_DESKTOP_1 + i as u32;
            let title = format!("Desktop {}", i + 1);
            self.entries.insert(
                id,
                QuickLaunchEntry {
                    bitmap: None,
                    title,
                    entry: None,
                },
            );
            buttons.push(ToolbarButton {
                id,
                bitmap: None,
                text: (i + 1).to_string(),
                pressed: i == current,
                separator: false,
            });
        }
        buttons.push(ToolbarButton::separator());

        let folder = shell.config().quick_launch_folder();
        if !folder.exists() && shell.config().quick_launch.create_if_missing {
            if let Err(e) = std::fs::create_dir_all(&folder) {
                warn!("Cannot create quick launch folder {:?}: {}", folder, e);
            }
        }
        for path in scan_folder(&folder) {
            if !is_quick_launch_id(self.next_id) {
                warn!("Quick launch folder has more entries than ids, rest skipped");
                break;
            }
            buttons.push(self.add_entry(shell, path));
        }

        platform.toolbar_add_buttons(self.hwnd, &buttons);
        match platform.toolbar_button_width(self.hwnd) {
            0 => debug!("Toolbar reports no button size, keeping {}", self.button_distance),
            width => self.button_distance = width,
        }
        info!("Quick launch bar holds {} buttons", self.entries.len());
    }

    fn add_fixed(&mut self, shell: &Shell, id: u32, title: &str, icon: &Icon) -> ToolbarButton {
        let bitmap = Self::bitmap(shell, icon);
        self.entries.insert(
            id,
            QuickLaunchEntry {
                bitmap,
                title: title.to_string(),
                entry: None,
            },
        );
        ToolbarButton {
            id,
            bitmap,
            text: String::new(),
            pressed: false,
            separator: false,
        }
    }

    fn add_entry(&mut self, shell: &Shell, path: PathBuf) -> ToolbarButton {
        let id = self.next_id;
        self.next_id += 1;

        let icon = shell.icons().extract(&path.to_string_lossy());
        let bitmap = Self::bitmap(shell, &icon);
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Quick launch {:#x}: {}", id, title);

        self.entries.insert(
            id,
            QuickLaunchEntry {
                bitmap,
                title,
                entry: Some(ShellEntry { path }),
            },
        );
        ToolbarButton {
            id,
            bitmap,
            text: String::new(),
            pressed: false,
            separator: false,
        }
    }

    fn bitmap(shell: &Shell, icon: &Icon) -> Option<NativeBitmap> {
        let background = Background {
            color: BUTTON_FACE,
            brush: None,
        };
        shell
            .icons()
            .create_bitmap(icon, background, DeviceContext(0))
    }

    pub fn entries(&self) -> &BTreeMap<u32, QuickLaunchEntry> {
        &self.entries
    }

    /// Preferred width for the bar layout
    pub fn width(&self) -> i32 {
        self.entries.len() as i32 * self.button_distance
    }

    fn update_desktop(&self, shell: &Shell, index: usize) {
        for i in 0..DESKTOP_COUNT {
            shell
                .platform()
                .toolbar_set_pressed(self.hwnd, ID_SWITCH_DESKTOP_1 + i as u32, i == index);
        }
    }
}

impl Controller for QuickLaunchBar {
    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        match msg {
            Message::App { id: PM_GET_WIDTH, .. } => Reply::Handled(self.width() as isize),
            Message::App {
                id: PM_UPDATE_DESKTOP,
                wparam,
                ..
            } => {
                self.update_desktop(shell, *wparam);
                Reply::Handled(0)
            }
            Message::App { id: PM_REFRESH, .. } => {
                self.refresh(shell);
                Reply::Handled(0)
            }
            _ => route_default(self, msg, shell),
        }
    }

    fn notify(&mut self, id: u32, code: i32, header: isize, shell: &Shell) -> Reply {
        if code != TTN_GETDISPINFO {
            return Reply::Default;
        }
        match self.entries.get(&id) {
            Some(entry) => {
                shell.platform().set_tooltip_text(header, &entry.title);
                Reply::Handled(0)
            }
            None => Reply::Default,
        }
    }

    fn command(&mut self, id: u32, _code: u32, shell: &Shell) -> Reply {
        if !is_quick_launch_id(id) {
            return Reply::Handled(0);
        }
        let Some(ShellEntry { path }) = self.entries.get(&id).and_then(|e| e.entry.as_ref()) else {
            return Reply::Handled(0);
        };
        if let Err(e) = shell.platform().launch(&path.to_string_lossy()) {
            warn!("Cannot launch {:?}: {}", path, e);
        }
        Reply::Handled(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for QuickLaunchBar {
    fn drop(&mut self) {
        self.release_bitmaps();
    }
}
