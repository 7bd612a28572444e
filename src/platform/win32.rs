//! Win32 implementation of the platform seam
//!
//! All shell window classes share one window procedure. It decodes the
//! native message, hands it to [`Shell::dispatch`] and finishes with
//! `DefWindowProcW` or the procedure replaced by subclassing.

use std::ffi::c_void;
use std::sync::Weak;

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use windows::core::{w, PWSTR};
use windows::Win32::Foundation::{
    BOOL, COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, SIZE, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleBitmap, CreateCompatibleDC, CreateSolidBrush, DeleteDC, DeleteObject,
    FillRect, GetDC, GetTextExtentPoint32W, ReleaseDC, SelectObject, COLOR_BTNFACE, HBRUSH, HDC,
    HGDIOBJ,
};
use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
use windows::Win32::System::DataExchange::COPYDATASTRUCT;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Controls::{
    ImageList_DrawEx, InitCommonControlsEx, HIMAGELIST, ICC_BAR_CLASSES, ILD_TRANSPARENT,
    INITCOMMONCONTROLSEX, NMHDR, NMTTDISPINFOW, TBADDBITMAP, TBBUTTON,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS,
};
use windows::Win32::UI::Shell::{
    ExtractIconExW, SHGetFileInfoW, SHRestricted, ShellExecuteW, REST_NOTRAYITEMSDISPLAY,
    SHFILEINFOW, SHGFI_SMALLICON, SHGFI_SYSICONINDEX,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::error::{ShellError, ShellResult};
use crate::render::icons::IconId;
use crate::shell::Shell;
use crate::utils::{hiword, loword, to_pcwstr, to_wide_string, Rect, Size};
use crate::window::{Chain, Dispatch, Message};

use super::{
    Background, DeviceContext, FileIcon, IconBackend, ImageList, NativeBitmap, NativeIcon,
    NativeProc, Placement, Platform, Restriction, ShowCommand, ToolbarButton, TopLevelWindow,
    WindowClass, WindowHandle, WindowSpec,
};

/// Shell receiving the messages of every shell window
static SHELL: OnceCell<Weak<Shell>> = OnceCell::new();

/// Toolbar messages and styles
const TB_CHECKBUTTON: u32 = 0x0402;
const TB_DELETEBUTTON: u32 = 0x0416;
const TB_BUTTONCOUNT: u32 = 0x0418;
const TB_ADDBITMAP: u32 = 0x0413;
const TB_BUTTONSTRUCTSIZE: u32 = 0x041E;
const TB_GETBUTTONSIZE: u32 = 0x043A;
const TB_ADDBUTTONSW: u32 = 0x0444;
const TBSTATE_CHECKED: u8 = 0x01;
const TBSTATE_ENABLED: u8 = 0x04;
const BTNS_SEP: u8 = 0x01;
const BTNS_CHECKGROUP: u8 = 0x06;
const TBSTYLE_TOOLTIPS: u32 = 0x0100;
const TBSTYLE_FLAT: u32 = 0x0800;
const CCS_NORESIZE: u32 = 0x0004;
const CCS_NODIVIDER: u32 = 0x0040;

/// Edge of the small icons drawn into toolbar bitmaps
const SMALL_ICON: i32 = 16;

/// Library holding the stock shell icons
const STOCK_ICON_LIBRARY: &str = "shell32.dll";

/// Index of the stock icon in the shell library for a well-known id
fn stock_icon_index(id: IconId) -> Option<i32> {
    let index = match id {
        IconId::APP => 2,
        IconId::FOLDER => 3,
        IconId::EXPLORER => 4,
        IconId::COMPUTER => 15,
        IconId::PRINTER => 16,
        IconId::NETWORK => 17,
        IconId::APPS => 19,
        IconId::DOCUMENTS => 20,
        IconId::CONFIG => 21,
        IconId::SEARCH | IconId::SEARCH_DOC => 22,
        IconId::INFO => 23,
        IconId::ACTION => 24,
        IconId::FAVORITES => 43,
        IconId::LOGOFF => 44,
        _ => return None,
    };
    Some(index)
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as _)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn to_rect(r: &RECT) -> Rect {
    Rect::from_edges(r.left, r.top, r.right, r.bottom)
}

fn to_native_rect(r: Rect) -> RECT {
    RECT {
        left: r.x,
        top: r.y,
        right: r.right(),
        bottom: r.bottom(),
    }
}

/// Run `f` on `dc`, or on the screen DC when `dc` is null
fn with_dc<R>(dc: DeviceContext, f: impl FnOnce(HDC) -> R) -> R {
    if dc.0 != 0 {
        return f(HDC(dc.0 as _));
    }
    unsafe {
        let screen = GetDC(None);
        let result = f(screen);
        ReleaseDC(None, screen);
        result
    }
}

/// Translate a native message into its decoded form
///
/// # Safety
/// `lparam` must be valid for the message kinds that carry a pointer.
unsafe fn decode(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Message {
    let (w, l) = (wparam.0, lparam.0);
    match msg {
        WM_CREATE => Message::Create,
        WM_NCDESTROY => Message::Destroy,
        WM_CLOSE => Message::Close,
        WM_SIZE => Message::Size {
            width: loword(l as usize) as i32,
            height: hiword(l as usize) as i32,
        },
        WM_COMMAND => Message::Command {
            id: loword(w),
            code: hiword(w),
        },
        WM_NOTIFY if l != 0 => {
            let header = &*(l as *const NMHDR);
            Message::Notify {
                id: header.idFrom as u32,
                code: header.code as i32,
                header: l,
            }
        }
        WM_HOTKEY => Message::Hotkey(w as i32),
        WM_TIMER => Message::Timer(w),
        WM_SYSCOMMAND => Message::SysCommand(w & 0xFFF0),
        WM_CONTEXTMENU => Message::ContextMenu {
            x: loword(l as usize) as i16 as i32,
            y: hiword(l as usize) as i16 as i32,
        },
        WM_COPYDATA if l != 0 => {
            let data = &*(l as *const COPYDATASTRUCT);
            let payload = if data.lpData.is_null() || data.cbData == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(data.lpData as *const u8, data.cbData as usize).to_vec()
            };
            Message::CopyData {
                tag: data.dwData,
                payload,
            }
        }
        WM_APP..=0xBFFF => Message::App {
            id: msg,
            wparam: w,
            lparam: l,
        },
        _ => Message::Other {
            id: msg,
            wparam: w,
            lparam: l,
        },
    }
}

/// Native form of a message that can be posted or sent
fn encode(msg: &Message) -> Option<(u32, WPARAM, LPARAM)> {
    let (id, w, l) = match *msg {
        Message::Close => (WM_CLOSE, 0, 0),
        Message::Size { width, height } => (
            WM_SIZE,
            0,
            (((height as u16 as u32) << 16) | width as u16 as u32) as isize,
        ),
        Message::Command { id, code } => (WM_COMMAND, ((code as usize) << 16) | id as usize, 0),
        Message::Notify { id, header, .. } => (WM_NOTIFY, id as usize, header),
        Message::Hotkey(id) => (WM_HOTKEY, id as usize, 0),
        Message::Timer(id) => (WM_TIMER, id, 0),
        Message::SysCommand(cmd) => (WM_SYSCOMMAND, cmd, 0),
        Message::App { id, wparam, lparam } | Message::Other { id, wparam, lparam } => {
            (id, wparam, lparam)
        }
        _ => return None,
    };
    Some((id, WPARAM(w), LPARAM(l)))
}

unsafe extern "system" fn shell_window_proc(
    window: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(shell) = SHELL.get().and_then(Weak::upgrade) else {
        return DefWindowProcW(window, msg, wparam, lparam);
    };

    let decoded = decode(msg, wparam, lparam);
    match shell.dispatch(handle(window), &decoded) {
        Dispatch::Handled(value) => LRESULT(value),
        Dispatch::Default(chain) => run_chain(window, chain, msg, wparam, lparam),
    }
}

/// Continue with the default procedure or the one replaced by subclassing
unsafe fn run_chain(window: HWND, chain: Chain, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match chain {
        Chain::DefaultProc => DefWindowProcW(window, msg, wparam, lparam),
        Chain::Original(original) => {
            let proc: WNDPROC = std::mem::transmute::<usize, WNDPROC>(original.0);
            CallWindowProcW(proc, window, msg, wparam, lparam)
        }
    }
}

unsafe extern "system" fn collect_top_level(window: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<TopLevelWindow>);
    let ex_style = GetWindowLongW(window, GWL_EXSTYLE) as u32;
    windows.push(TopLevelWindow {
        handle: handle(window),
        visible: IsWindowVisible(window).as_bool(),
        minimized: IsIconic(window).as_bool(),
        maximized: IsZoomed(window).as_bool(),
        tool_window: ex_style & WS_EX_TOOLWINDOW.0 != 0,
    });
    BOOL(1)
}

/// Win32 platform; one per process
pub struct Win32Platform {
    module: isize,
}

impl Win32Platform {
    /// Register the shell window classes
    pub fn new() -> ShellResult<Self> {
        unsafe {
            let controls = INITCOMMONCONTROLSEX {
                dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
                dwICC: ICC_BAR_CLASSES,
            };
            if !InitCommonControlsEx(&controls).as_bool() {
                warn!("Common controls initialization failed");
            }

            let module = GetModuleHandleW(None)?;
            let platform = Self {
                module: module.0 as isize,
            };
            for class in [
                WindowClass::DesktopBar,
                WindowClass::TaskBar,
                WindowClass::NotifyArea,
                WindowClass::StartMenu,
            ] {
                platform.register_class(class)?;
            }
            Ok(platform)
        }
    }

    fn instance(&self) -> HINSTANCE {
        HINSTANCE(self.module as _)
    }

    fn register_class(&self, class: WindowClass) -> ShellResult<()> {
        let name = to_wide_string(class.class_name());
        unsafe {
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_DBLCLKS,
                lpfnWndProc: Some(shell_window_proc),
                hInstance: self.instance(),
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as _),
                lpszClassName: to_pcwstr(&name),
                ..Default::default()
            };
            if RegisterClassExW(&wc) == 0 {
                return Err(ShellError::WindowCreation(format!(
                    "cannot register class {}",
                    class.class_name()
                )));
            }
        }
        debug!("Registered window class {}", class.class_name());
        Ok(())
    }

    fn styles(spec: &WindowSpec) -> (WINDOW_EX_STYLE, WINDOW_STYLE) {
        let visible = if spec.visible { WS_VISIBLE } else { WINDOW_STYLE(0) };
        match spec.class {
            WindowClass::DesktopBar => (
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                WS_POPUP | WS_CLIPCHILDREN | visible,
            ),
            WindowClass::StartMenu => (
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                WS_POPUP | WS_BORDER | visible,
            ),
            WindowClass::Toolbar => (
                WINDOW_EX_STYLE(0),
                WS_CHILD
                    | WS_CLIPSIBLINGS
                    | visible
                    | WINDOW_STYLE(TBSTYLE_FLAT | TBSTYLE_TOOLTIPS | CCS_NORESIZE | CCS_NODIVIDER),
            ),
            WindowClass::TaskBar | WindowClass::NotifyArea | WindowClass::Button => {
                (WINDOW_EX_STYLE(0), WS_CHILD | WS_CLIPSIBLINGS | visible)
            }
        }
    }

    /// Run the message loop until `quit`; returns the exit code
    pub fn run_message_loop(&self) -> i32 {
        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            msg.wParam.0 as i32
        }
    }

    fn message_box(&self, owner: WindowHandle, text: &str, style: MESSAGEBOX_STYLE) -> MESSAGEBOX_RESULT {
        let text = to_wide_string(text);
        unsafe { MessageBoxW(hwnd(owner), to_pcwstr(&text), w!("ShellBar"), style) }
    }
}

impl Platform for Win32Platform {
    fn attach(&self, shell: Weak<Shell>) {
        if SHELL.set(shell).is_err() {
            warn!("Platform already attached to a shell");
        }
    }

    fn create_window(&self, spec: &WindowSpec) -> ShellResult<WindowHandle> {
        let class = to_wide_string(spec.class.class_name());
        let title = to_wide_string(&spec.title);
        let (ex_style, style) = Self::styles(spec);
        let parent = spec.parent.map(hwnd).unwrap_or_default();
        // popups are owned, children carry their control id
        let menu = match (spec.class, spec.parent) {
            (WindowClass::DesktopBar | WindowClass::StartMenu, _) | (_, None) => HMENU::default(),
            _ => HMENU(spec.id as usize as _),
        };

        let created = unsafe {
            CreateWindowExW(
                ex_style,
                to_pcwstr(&class),
                to_pcwstr(&title),
                style,
                spec.rect.x,
                spec.rect.y,
                spec.rect.width,
                spec.rect.height,
                parent,
                menu,
                self.instance(),
                None,
            )
        };
        let window = created.map_err(|e| {
            ShellError::WindowCreation(format!("{:?}: {}", spec.class, e))
        })?;

        if spec.class == WindowClass::Toolbar {
            unsafe {
                SendMessageW(
                    window,
                    TB_BUTTONSTRUCTSIZE,
                    WPARAM(std::mem::size_of::<TBBUTTON>()),
                    LPARAM(0),
                );
            }
        }
        Ok(handle(window))
    }

    fn destroy_window(&self, handle: WindowHandle) {
        unsafe {
            if let Err(e) = DestroyWindow(hwnd(handle)) {
                debug!("DestroyWindow({:?}) failed: {}", handle, e);
            }
        }
    }

    fn subclass(&self, handle: WindowHandle) -> ShellResult<NativeProc> {
        let previous = unsafe {
            SetWindowLongPtrW(
                hwnd(handle),
                GWLP_WNDPROC,
                shell_window_proc as usize as isize,
            )
        };
        if previous == 0 {
            return Err(ShellError::Platform(format!("cannot subclass {:?}", handle)));
        }
        Ok(NativeProc(previous as usize))
    }

    fn restore_proc(&self, handle: WindowHandle, original: NativeProc) {
        unsafe {
            SetWindowLongPtrW(hwnd(handle), GWLP_WNDPROC, original.0 as isize);
        }
    }

    fn post_message(&self, handle: WindowHandle, msg: &Message) -> bool {
        let Some((id, w, l)) = encode(msg) else {
            warn!("{:?} cannot be posted", msg);
            return false;
        };
        unsafe { PostMessageW(hwnd(handle), id, w, l).is_ok() }
    }

    fn send_native(&self, handle: WindowHandle, msg: &Message) -> isize {
        let Some((id, w, l)) = encode(msg) else {
            warn!("{:?} cannot be sent", msg);
            return 0;
        };
        unsafe { SendMessageW(hwnd(handle), id, w, l).0 }
    }

    fn call_chain(&self, handle: WindowHandle, chain: Chain, msg: &Message) -> isize {
        let Some((id, w, l)) = encode(msg) else {
            debug!("{:?} has no native form, chain skipped", msg);
            return 0;
        };
        unsafe { run_chain(hwnd(handle), chain, id, w, l).0 }
    }

    fn broadcast(&self, message_id: u32, wparam: usize) {
        unsafe {
            if let Err(e) = PostMessageW(HWND_BROADCAST, message_id, WPARAM(wparam), LPARAM(0)) {
                warn!("Broadcast of {:#x} failed: {}", message_id, e);
            }
        }
    }

    fn register_window_message(&self, name: &str) -> u32 {
        let name = to_wide_string(name);
        unsafe { RegisterWindowMessageW(to_pcwstr(&name)) }
    }

    fn screen_size(&self) -> Size {
        unsafe { Size::new(GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
    }

    fn work_area(&self) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe {
            SystemParametersInfoW(
                SPI_GETWORKAREA,
                0,
                Some(&mut rect as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
            .ok()?;
        }
        Some(to_rect(&rect))
    }

    fn set_work_area(&self, area: Rect) -> bool {
        let mut rect = to_native_rect(area);
        unsafe {
            SystemParametersInfoW(
                SPI_SETWORKAREA,
                0,
                Some(&mut rect as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
            .is_ok()
        }
    }

    fn window_rect(&self, handle: WindowHandle) -> Rect {
        let mut rect = RECT::default();
        unsafe {
            let _ = GetWindowRect(hwnd(handle), &mut rect);
        }
        to_rect(&rect)
    }

    fn client_size(&self, handle: WindowHandle) -> Size {
        let mut rect = RECT::default();
        unsafe {
            let _ = GetClientRect(hwnd(handle), &mut rect);
        }
        Size::new(rect.right - rect.left, rect.bottom - rect.top)
    }

    fn apply_layout(&self, placements: &[Placement]) -> ShellResult<()> {
        unsafe {
            let mut batch = BeginDeferWindowPos(placements.len() as i32)?;
            for p in placements {
                batch = DeferWindowPos(
                    batch,
                    hwnd(p.handle),
                    None,
                    p.rect.x,
                    p.rect.y,
                    p.rect.width,
                    p.rect.height,
                    SWP_NOZORDER | SWP_NOACTIVATE,
                )?;
            }
            EndDeferWindowPos(batch)?;
        }
        Ok(())
    }

    fn show_window(&self, handle: WindowHandle, cmd: ShowCommand) {
        let cmd = match cmd {
            ShowCommand::Hide => SW_HIDE,
            ShowCommand::Show => SW_SHOW,
            ShowCommand::ShowNoActivate => SW_SHOWNOACTIVATE,
            ShowCommand::Minimize => SW_MINIMIZE,
            ShowCommand::Maximize => SW_MAXIMIZE,
            ShowCommand::Restore => SW_RESTORE,
        };
        unsafe {
            let _ = ShowWindow(hwnd(handle), cmd);
        }
    }

    fn set_timer(&self, handle: WindowHandle, id: usize, interval_ms: u32) {
        unsafe {
            if SetTimer(hwnd(handle), id, interval_ms, None) == 0 {
                warn!("SetTimer({:?}, {}) failed", handle, id);
            }
        }
    }

    fn kill_timer(&self, handle: WindowHandle, id: usize) {
        unsafe {
            let _ = KillTimer(hwnd(handle), id);
        }
    }

    fn register_hotkey(&self, handle: WindowHandle, id: i32, modifiers: u32, key: u32) -> bool {
        unsafe { RegisterHotKey(hwnd(handle), id, HOT_KEY_MODIFIERS(modifiers), key).is_ok() }
    }

    fn unregister_hotkey(&self, handle: WindowHandle, id: i32) {
        unsafe {
            let _ = UnregisterHotKey(hwnd(handle), id);
        }
    }

    fn top_level_windows(&self) -> Vec<TopLevelWindow> {
        let mut windows: Vec<TopLevelWindow> = Vec::new();
        unsafe {
            let _ = EnumWindows(
                Some(collect_top_level),
                LPARAM(&mut windows as *mut Vec<TopLevelWindow> as isize),
            );
        }
        windows
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let window = unsafe { GetForegroundWindow() };
        let window = handle(window);
        (!window.is_null()).then_some(window)
    }

    fn set_foreground_window(&self, handle: WindowHandle) {
        unsafe {
            let _ = SetForegroundWindow(hwnd(handle));
        }
    }

    fn confirm_exit(&self, owner: WindowHandle) -> bool {
        self.message_box(
            owner,
            "Do you really want to exit the desktop shell?",
            MB_YESNO | MB_ICONQUESTION,
        ) == IDYES
    }

    fn show_about(&self, owner: WindowHandle) {
        let text = format!(
            "ShellBar v{}\n\nDesktop bar, quick launch and notification area.",
            env!("CARGO_PKG_VERSION")
        );
        self.message_box(owner, &text, MB_OK | MB_ICONINFORMATION);
    }

    fn show_settings(&self, owner: WindowHandle) {
        let path = crate::config::Config::config_path();
        if let Err(e) = self.launch(&path.to_string_lossy()) {
            warn!("Cannot open settings: {}", e);
            let text = format!("Settings are stored in\n{}", path.display());
            self.message_box(owner, &text, MB_OK | MB_ICONINFORMATION);
        }
    }

    fn track_popup_menu(
        &self,
        owner: WindowHandle,
        items: &[(u32, &str)],
        x: i32,
        y: i32,
    ) -> Option<u32> {
        let labels: Vec<Vec<u16>> = items.iter().map(|(_, label)| to_wide_string(label)).collect();
        unsafe {
            let menu = match CreatePopupMenu() {
                Ok(menu) => menu,
                Err(e) => {
                    warn!("Cannot create popup menu: {}", e);
                    return None;
                }
            };
            for ((id, _), label) in items.iter().zip(&labels) {
                let _ = AppendMenuW(menu, MF_STRING, *id as usize, to_pcwstr(label));
            }
            // the menu only closes on outside clicks while the owner is foreground
            let _ = SetForegroundWindow(hwnd(owner));
            let chosen = TrackPopupMenu(
                menu,
                TPM_RETURNCMD | TPM_RIGHTBUTTON,
                x,
                y,
                0,
                hwnd(owner),
                None,
            );
            let _ = DestroyMenu(menu);
            (chosen.0 > 0).then_some(chosen.0 as u32)
        }
    }

    fn set_tooltip_text(&self, header: isize, text: &str) {
        if header == 0 {
            return;
        }
        unsafe {
            let info = &mut *(header as *mut NMTTDISPINFOW);
            let capacity = info.szText.len() - 1;
            let mut len = 0;
            for (slot, unit) in info.szText.iter_mut().zip(text.encode_utf16().take(capacity)) {
                *slot = unit;
                len += 1;
            }
            info.szText[len] = 0;
            info.lpszText = PWSTR(info.szText.as_mut_ptr());
        }
    }

    fn launch(&self, target: &str) -> ShellResult<()> {
        let wide = to_wide_string(target);
        let result = unsafe {
            ShellExecuteW(None, w!("open"), to_pcwstr(&wide), None, None, SW_SHOWNORMAL)
        };
        // values up to 32 are error codes
        if result.0 as isize <= 32 {
            return Err(ShellError::Launch(format!("{} (code {})", target, result.0 as isize)));
        }
        info!("Launched {}", target);
        Ok(())
    }

    fn is_restricted(&self, restriction: Restriction) -> bool {
        let rest = match restriction {
            Restriction::NoTrayItemsDisplay => REST_NOTRAYITEMSDISPLAY,
        };
        unsafe { SHRestricted(rest) != 0 }
    }

    fn text_width(&self, handle: WindowHandle, text: &str) -> i32 {
        let wide: Vec<u16> = text.encode_utf16().collect();
        let mut size = SIZE::default();
        unsafe {
            let dc = GetDC(hwnd(handle));
            let _ = GetTextExtentPoint32W(dc, &wide, &mut size);
            ReleaseDC(hwnd(handle), dc);
        }
        size.cx
    }

    fn toolbar_add_buttons(&self, toolbar: WindowHandle, buttons: &[ToolbarButton]) {
        let window = hwnd(toolbar);
        let mut texts: Vec<Vec<u16>> = Vec::with_capacity(buttons.len());
        let mut native: Vec<TBBUTTON> = Vec::with_capacity(buttons.len());

        for button in buttons {
            if button.separator {
                native.push(TBBUTTON {
                    fsStyle: BTNS_SEP,
                    ..Default::default()
                });
                continue;
            }

            let image = match button.bitmap {
                Some(bitmap) => unsafe {
                    let add = TBADDBITMAP {
                        hInst: HINSTANCE::default(),
                        nID: bitmap.0 as usize,
                    };
                    SendMessageW(
                        window,
                        TB_ADDBITMAP,
                        WPARAM(1),
                        LPARAM(&add as *const TBADDBITMAP as isize),
                    )
                    .0 as i32
                },
                None => -2,
            };
            let string = if button.text.is_empty() {
                -1
            } else {
                texts.push(to_wide_string(&button.text));
                texts.last().map(|t| t.as_ptr() as isize).unwrap_or(-1)
            };
            let mut state = TBSTATE_ENABLED;
            if button.pressed {
                state |= TBSTATE_CHECKED;
            }
            let style = if button.text.is_empty() { 0 } else { BTNS_CHECKGROUP };
            native.push(TBBUTTON {
                iBitmap: image,
                idCommand: button.id as i32,
                fsState: state,
                fsStyle: style,
                iString: string,
                ..Default::default()
            });
        }

        unsafe {
            SendMessageW(
                window,
                TB_ADDBUTTONSW,
                WPARAM(native.len()),
                LPARAM(native.as_ptr() as isize),
            );
        }
    }

    fn toolbar_set_pressed(&self, toolbar: WindowHandle, id: u32, pressed: bool) {
        unsafe {
            SendMessageW(
                hwnd(toolbar),
                TB_CHECKBUTTON,
                WPARAM(id as usize),
                LPARAM(pressed as isize),
            );
        }
    }

    fn toolbar_button_width(&self, toolbar: WindowHandle) -> i32 {
        let size = unsafe { SendMessageW(hwnd(toolbar), TB_GETBUTTONSIZE, WPARAM(0), LPARAM(0)) };
        loword(size.0 as usize) as i32
    }

    fn toolbar_clear(&self, toolbar: WindowHandle) {
        unsafe {
            let count = SendMessageW(hwnd(toolbar), TB_BUTTONCOUNT, WPARAM(0), LPARAM(0)).0;
            for _ in 0..count {
                SendMessageW(hwnd(toolbar), TB_DELETEBUTTON, WPARAM(0), LPARAM(0));
            }
        }
    }

    fn quit(&self, code: i32) {
        unsafe { PostQuitMessage(code) }
    }
}

/// Icon extraction through the shell and drawing through GDI
pub struct Win32IconBackend {
    stock_library: Vec<u16>,
}

impl Win32IconBackend {
    pub fn new() -> Self {
        Self {
            stock_library: to_wide_string(STOCK_ICON_LIBRARY),
        }
    }

    fn extract_small(file: &[u16], index: i32) -> Option<NativeIcon> {
        let mut small = HICON::default();
        let count =
            unsafe { ExtractIconExW(to_pcwstr(file), index, None, Some(&mut small as *mut HICON), 1) };
        (count > 0 && !small.is_invalid()).then(|| NativeIcon(small.0 as isize))
    }

    fn with_brush<R>(background: Background, f: impl FnOnce(HBRUSH) -> R) -> R {
        if let Some(brush) = background.brush {
            return f(HBRUSH(brush.0 as _));
        }
        unsafe {
            let brush = CreateSolidBrush(COLORREF(background.color.0));
            let result = f(brush);
            let _ = DeleteObject(HGDIOBJ(brush.0));
            result
        }
    }

    /// Draw into a fresh bitmap of the small icon size
    fn render_bitmap(
        &self,
        dc: DeviceContext,
        background: Background,
        draw: impl FnOnce(HDC, Rect),
    ) -> Option<NativeBitmap> {
        with_dc(dc, |reference| unsafe {
            let memory = CreateCompatibleDC(reference);
            if memory.is_invalid() {
                return None;
            }
            let bitmap = CreateCompatibleBitmap(reference, SMALL_ICON, SMALL_ICON);
            if bitmap.is_invalid() {
                let _ = DeleteDC(memory);
                return None;
            }
            let previous = SelectObject(memory, HGDIOBJ(bitmap.0));
            let rect = Rect::new(0, 0, SMALL_ICON, SMALL_ICON);
            Self::with_brush(background, |brush| {
                FillRect(memory, &to_native_rect(rect), brush);
            });
            draw(memory, rect);
            SelectObject(memory, previous);
            let _ = DeleteDC(memory);
            Some(NativeBitmap(bitmap.0 as isize))
        })
    }
}

impl Default for Win32IconBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IconBackend for Win32IconBackend {
    fn file_icon(&self, path: &str) -> Option<FileIcon> {
        let wide = to_wide_string(path);
        let mut info = SHFILEINFOW::default();
        let list = unsafe {
            SHGetFileInfoW(
                to_pcwstr(&wide),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut info as *mut SHFILEINFOW),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_SYSICONINDEX | SHGFI_SMALLICON,
            )
        };
        if list == 0 {
            return None;
        }
        Some(FileIcon::SysIndex(ImageList(list as isize), info.iIcon))
    }

    fn indexed_icon(&self, path: &str, index: i32) -> Option<NativeIcon> {
        Self::extract_small(&to_wide_string(path), index)
    }

    fn stock_icon(&self, id: IconId) -> Option<NativeIcon> {
        let index = stock_icon_index(id)?;
        Self::extract_small(&self.stock_library, index).or_else(|| {
            debug!("Stock icon {} missing, using the generic application icon", index);
            unsafe { LoadIconW(None, IDI_APPLICATION) }
                .ok()
                .map(|h| NativeIcon(h.0 as isize))
        })
    }

    fn destroy_icon(&self, icon: NativeIcon) {
        unsafe {
            let _ = DestroyIcon(HICON(icon.0 as _));
        }
    }

    fn destroy_bitmap(&self, bitmap: NativeBitmap) {
        unsafe {
            let _ = DeleteObject(HGDIOBJ(bitmap.0 as _));
        }
    }

    fn fill_background(&self, dc: DeviceContext, rect: Rect, background: Background) {
        Self::with_brush(background, |brush| unsafe {
            FillRect(HDC(dc.0 as _), &to_native_rect(rect), brush);
        });
    }

    fn draw_icon(&self, dc: DeviceContext, icon: NativeIcon, rect: Rect, background: Background) {
        Self::with_brush(background, |brush| unsafe {
            let _ = DrawIconEx(
                HDC(dc.0 as _),
                rect.x,
                rect.y,
                HICON(icon.0 as _),
                rect.width,
                rect.height,
                0,
                brush,
                DI_NORMAL,
            );
        });
    }

    fn draw_image_list(
        &self,
        dc: DeviceContext,
        list: ImageList,
        index: i32,
        rect: Rect,
        background: Background,
    ) {
        unsafe {
            let _ = ImageList_DrawEx(
                HIMAGELIST(list.0 as _),
                index,
                HDC(dc.0 as _),
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                COLORREF(background.color.0),
                COLORREF(0xFFFF_FFFF),
                ILD_TRANSPARENT,
            );
        }
    }

    fn bitmap_from_icon(
        &self,
        icon: NativeIcon,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        self.render_bitmap(dc, background, |memory, rect| {
            self.draw_icon(DeviceContext(memory.0 as isize), icon, rect, background);
        })
    }

    fn bitmap_from_image_list(
        &self,
        list: ImageList,
        index: i32,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        self.render_bitmap(dc, background, |memory, rect| {
            self.draw_image_list(DeviceContext(memory.0 as isize), list, index, rect, background);
        })
    }
}
