//! Decoded window messages and the reserved numeric ranges
//!
//! Ids and private message numbers are shared with sibling components and
//! with external senders, so the blocks below are fixed.

/// Base of the application-private message range
pub const WM_APP: u32 = 0x8000;

/// Parent: re-run child layout from the current client size
pub const PM_RESIZE_CHILDREN: u32 = WM_APP + 0x17;
/// Child: report preferred width
pub const PM_GET_WIDTH: u32 = WM_APP + 0x18;
/// Child: rescan contents
pub const PM_REFRESH: u32 = WM_APP + 0x1B;
/// Quick launch: desktop `wparam` became active
pub const PM_UPDATE_DESKTOP: u32 = WM_APP + 0x1C;
/// Taskbar: last active application window
pub const PM_GET_LAST_ACTIVE: u32 = WM_APP + 0x1D;

/// Start button control id
pub const IDC_START: u32 = 0x1000;
/// First quick launch button id; the block spans 0x4000..=0x40FF
pub const IDC_FIRST_QUICK_ID: u32 = 0x4000;

pub const ID_ABOUT_EXPLORER: u32 = 40005;
pub const ID_DESKTOPBAR_SETTINGS: u32 = 40008;
pub const ID_MINIMIZE_ALL: u32 = 40011;
pub const ID_EXPLORE: u32 = 40012;
/// First of four consecutive desktop switch commands
pub const ID_SWITCH_DESKTOP_1: u32 = 40013;
pub const ID_TASKMGR: u32 = 40020;

/// Child window ids inside the desktop bar
pub const IDW_TASKBAR: u32 = 100;
pub const IDW_QUICKLAUNCHBAR: u32 = 101;
pub const IDW_TRAYNOTIFY: u32 = 102;

/// `WM_SYSCOMMAND` request to show the task list (start menu)
pub const SC_TASKLIST: usize = 0xF130;

/// Broadcast after the work area changed
pub const WM_SETTINGCHANGE: u32 = 0x001A;
pub const SPI_SETWORKAREA: usize = 0x002F;

/// Tooltip text request (`TTN_GETDISPINFOW`)
pub const TTN_GETDISPINFO: i32 = -530;

/// Copy-data tag of tray notifications
pub const COPYDATA_TRAY_NOTIFY: usize = 1;

/// Name of the broadcast announcing a (re)started shell
pub const WINMSG_TASKBARCREATED: &str = "TaskbarCreated";

/// A window message decoded from its native form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Window creation (`WM_CREATE`)
    Create,
    /// Final destroy notification (`WM_NCDESTROY`); the handle is still valid
    Destroy,
    Close,
    Size { width: i32, height: i32 },
    Command { id: u32, code: u32 },
    /// `header` is the address of the native notification block, valid
    /// only while the message is being delivered
    Notify { id: u32, code: i32, header: isize },
    Hotkey(i32),
    Timer(usize),
    SysCommand(usize),
    ContextMenu { x: i32, y: i32 },
    /// Cross-process data (`WM_COPYDATA`), payload copied out of the sender
    CopyData { tag: usize, payload: Vec<u8> },
    /// Private message in the `WM_APP` range
    App { id: u32, wparam: usize, lparam: isize },
    /// Anything the shell does not decode
    Other { id: u32, wparam: usize, lparam: isize },
}

impl Message {
    /// Private message with a `wparam`
    pub fn app(id: u32, wparam: usize) -> Self {
        Message::App { id, wparam, lparam: 0 }
    }

    /// Numeric id of a private message, if it is one
    pub fn app_id(&self) -> Option<u32> {
        match self {
            Message::App { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Whether a command id belongs to the quick launch block
pub fn is_quick_launch_id(id: u32) -> bool {
    (id & !0xFF) == IDC_FIRST_QUICK_ID
}

/// Desktop index addressed by a desktop switch command
pub fn desktop_switch_index(id: u32) -> Option<usize> {
    (ID_SWITCH_DESKTOP_1..ID_SWITCH_DESKTOP_1 + crate::desktops::DESKTOP_COUNT as u32)
        .contains(&id)
        .then(|| (id - ID_SWITCH_DESKTOP_1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_launch_block_is_one_page() {
        assert!(is_quick_launch_id(IDC_FIRST_QUICK_ID));
        assert!(is_quick_launch_id(IDC_FIRST_QUICK_ID + 0xFF));
        assert!(!is_quick_launch_id(IDC_FIRST_QUICK_ID + 0x100));
        assert!(!is_quick_launch_id(IDC_START));
    }

    #[test]
    fn desktop_switch_covers_four_slots() {
        assert_eq!(desktop_switch_index(ID_SWITCH_DESKTOP_1), Some(0));
        assert_eq!(desktop_switch_index(ID_SWITCH_DESKTOP_1 + 3), Some(3));
        assert_eq!(desktop_switch_index(ID_SWITCH_DESKTOP_1 + 4), None);
        assert_eq!(desktop_switch_index(ID_MINIMIZE_ALL), None);
    }

    #[test]
    fn private_ranges_do_not_overlap() {
        let ids = [
            PM_RESIZE_CHILDREN,
            PM_GET_WIDTH,
            PM_REFRESH,
            PM_UPDATE_DESKTOP,
            PM_GET_LAST_ACTIVE,
        ];
        for (i, a) in ids.iter().enumerate() {
            assert!(*a >= WM_APP);
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(ID_TASKMGR > ID_SWITCH_DESKTOP_1 + 3);
    }
}
