//! Recording in-memory platform for tests
//!
//! Windows are plain map entries. Creation and destruction dispatch the same
//! messages the native platform would (`Create` then `Size`, children are
//! destroyed before their parent) and posted messages wait in a queue until
//! the test pumps them.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ShellError, ShellResult};
use crate::render::icons::IconId;
use crate::shell::Shell;
use crate::utils::{Rect, Size};
use crate::window::{Chain, Dispatch, Message};

use super::{
    Background, DeviceContext, FileIcon, IconBackend, ImageList, NativeBitmap, NativeIcon,
    NativeProc, Placement, Platform, Restriction, ShowCommand, ToolbarButton, TopLevelWindow,
    WindowClass, WindowHandle, WindowSpec,
};

#[derive(Debug, Clone)]
struct MockWindow {
    class: WindowClass,
    parent: Option<WindowHandle>,
    id: u32,
    rect: Rect,
    visible: bool,
}

struct MockState {
    windows: BTreeMap<WindowHandle, MockWindow>,
    screen: Size,
    work_area: Option<Rect>,
    work_area_sets: Vec<Rect>,
    confirm_answer: bool,
    confirm_prompts: usize,
    restrictions: Vec<Restriction>,
    top_level: Vec<TopLevelWindow>,
    foreground: Option<WindowHandle>,
    show_calls: Vec<(WindowHandle, ShowCommand)>,
    launched: Vec<String>,
    fail_launch: bool,
    broadcasts: Vec<(u32, usize)>,
    registered_messages: Vec<String>,
    hotkeys: BTreeMap<i32, (u32, u32)>,
    layouts: Vec<Vec<Placement>>,
    toolbars: HashMap<WindowHandle, Vec<ToolbarButton>>,
    timers: BTreeSet<(WindowHandle, usize)>,
    restored: Vec<(WindowHandle, NativeProc)>,
    native_sends: Vec<(WindowHandle, Message)>,
    chained: Vec<(WindowHandle, Message)>,
    about_shown: usize,
    settings_shown: usize,
    popup_choice: Option<u32>,
    popups: Vec<(Vec<u32>, i32, i32)>,
    tooltips: Vec<(isize, String)>,
    button_width: i32,
    quit: Option<i32>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            windows: BTreeMap::new(),
            screen: Size::new(1024, 768),
            work_area: Some(Rect::new(0, 0, 1024, 768)),
            work_area_sets: Vec::new(),
            confirm_answer: true,
            confirm_prompts: 0,
            restrictions: Vec::new(),
            top_level: Vec::new(),
            foreground: None,
            show_calls: Vec::new(),
            launched: Vec::new(),
            fail_launch: false,
            broadcasts: Vec::new(),
            registered_messages: Vec::new(),
            hotkeys: BTreeMap::new(),
            layouts: Vec::new(),
            toolbars: HashMap::new(),
            timers: BTreeSet::new(),
            restored: Vec::new(),
            native_sends: Vec::new(),
            chained: Vec::new(),
            about_shown: 0,
            settings_shown: 0,
            popup_choice: None,
            popups: Vec::new(),
            tooltips: Vec::new(),
            button_width: 24,
            quit: None,
        }
    }
}

/// In-memory platform
pub struct MockPlatform {
    shell: Mutex<Weak<Shell>>,
    next_handle: AtomicIsize,
    state: Mutex<MockState>,
    queue: Mutex<VecDeque<(WindowHandle, Message)>>,
}

/// Build a shell on a fresh mock platform with default configuration
pub fn mock_shell() -> (Arc<MockPlatform>, Arc<Shell>) {
    mock_shell_with(Config::default())
}

pub fn mock_shell_with(config: Config) -> (Arc<MockPlatform>, Arc<Shell>) {
    let platform = Arc::new(MockPlatform::new());
    let shell = Shell::new(
        platform.clone(),
        Arc::new(MockIconBackend::new()),
        Arc::new(config),
    );
    (platform, shell)
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            shell: Mutex::new(Weak::new()),
            next_handle: AtomicIsize::new(0x100),
            state: Mutex::new(MockState::default()),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Procedure value reported as replaced when `handle` is subclassed
    pub fn original_proc(handle: WindowHandle) -> NativeProc {
        NativeProc(0x10_0000 + handle.0 as usize)
    }

    fn shell(&self) -> Option<Arc<Shell>> {
        self.shell.lock().upgrade()
    }

    /// Deliver a message the way the native loop would, emulating the
    /// default procedure for `Close`
    pub fn deliver(&self, handle: WindowHandle, msg: Message) -> isize {
        let Some(shell) = self.shell() else {
            return 0;
        };
        match shell.dispatch(handle, &msg) {
            Dispatch::Handled(value) => value,
            Dispatch::Default(chain) => self.call_chain(handle, chain, &msg),
        }
    }

    /// Deliver queued messages until the queue is empty
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.queue.lock().pop_front();
            let Some((handle, msg)) = next else {
                return delivered;
            };
            if self.window_exists(handle) {
                self.deliver(handle, msg);
                delivered += 1;
            }
        }
    }

    pub fn queued(&self) -> Vec<(WindowHandle, Message)> {
        self.queue.lock().iter().cloned().collect()
    }

    pub fn window_exists(&self, handle: WindowHandle) -> bool {
        self.state.lock().windows.contains_key(&handle)
    }

    pub fn live_windows(&self) -> usize {
        self.state.lock().windows.len()
    }

    pub fn child_with_id(&self, parent: WindowHandle, id: u32) -> Option<WindowHandle> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|(_, w)| w.parent == Some(parent) && w.id == id)
            .map(|(h, _)| *h)
    }

    pub fn windows_of_class(&self, class: WindowClass) -> Vec<WindowHandle> {
        self.state
            .lock()
            .windows
            .iter()
            .filter(|(_, w)| w.class == class)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn is_visible(&self, handle: WindowHandle) -> bool {
        let state = self.state.lock();
        if let Some(w) = state.top_level.iter().find(|w| w.handle == handle) {
            return w.visible;
        }
        state.windows.get(&handle).map(|w| w.visible).unwrap_or(false)
    }

    pub fn set_screen(&self, size: Size) {
        self.state.lock().screen = size;
    }

    pub fn set_work_area_value(&self, area: Option<Rect>) {
        self.state.lock().work_area = area;
    }

    pub fn work_area_sets(&self) -> Vec<Rect> {
        self.state.lock().work_area_sets.clone()
    }

    pub fn set_confirm_exit(&self, answer: bool) {
        self.state.lock().confirm_answer = answer;
    }

    pub fn confirm_prompts(&self) -> usize {
        self.state.lock().confirm_prompts
    }

    pub fn set_restricted(&self, restriction: Restriction) {
        self.state.lock().restrictions.push(restriction);
    }

    pub fn set_top_level(&self, windows: Vec<TopLevelWindow>) {
        self.state.lock().top_level = windows;
    }

    pub fn set_foreground(&self, handle: Option<WindowHandle>) {
        self.state.lock().foreground = handle;
    }

    pub fn foreground(&self) -> Option<WindowHandle> {
        self.state.lock().foreground
    }

    pub fn show_calls(&self) -> Vec<(WindowHandle, ShowCommand)> {
        self.state.lock().show_calls.clone()
    }

    pub fn launched(&self) -> Vec<String> {
        self.state.lock().launched.clone()
    }

    pub fn set_fail_launch(&self, fail: bool) {
        self.state.lock().fail_launch = fail;
    }

    pub fn broadcasts(&self) -> Vec<(u32, usize)> {
        self.state.lock().broadcasts.clone()
    }

    pub fn hotkeys(&self) -> BTreeMap<i32, (u32, u32)> {
        self.state.lock().hotkeys.clone()
    }

    pub fn layouts(&self) -> Vec<Vec<Placement>> {
        self.state.lock().layouts.clone()
    }

    pub fn toolbar_buttons(&self, toolbar: WindowHandle) -> Vec<ToolbarButton> {
        self.state
            .lock()
            .toolbars
            .get(&toolbar)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_timer(&self, handle: WindowHandle, id: usize) -> bool {
        self.state.lock().timers.contains(&(handle, id))
    }

    pub fn restored_procs(&self) -> Vec<(WindowHandle, NativeProc)> {
        self.state.lock().restored.clone()
    }

    /// Messages passed on to a replaced procedure
    pub fn chained(&self) -> Vec<(WindowHandle, Message)> {
        self.state.lock().chained.clone()
    }

    pub fn native_sends(&self) -> Vec<(WindowHandle, Message)> {
        self.state.lock().native_sends.clone()
    }

    pub fn about_shown(&self) -> usize {
        self.state.lock().about_shown
    }

    pub fn settings_shown(&self) -> usize {
        self.state.lock().settings_shown
    }

    /// Command the next popup menu returns
    pub fn set_popup_choice(&self, id: Option<u32>) {
        self.state.lock().popup_choice = id;
    }

    /// Offered ids and position of every popup menu shown
    pub fn popups(&self) -> Vec<(Vec<u32>, i32, i32)> {
        self.state.lock().popups.clone()
    }

    pub fn tooltips(&self) -> Vec<(isize, String)> {
        self.state.lock().tooltips.clone()
    }

    pub fn set_toolbar_button_width(&self, width: i32) {
        self.state.lock().button_width = width;
    }

    pub fn quit_code(&self) -> Option<i32> {
        self.state.lock().quit
    }
}

impl Platform for MockPlatform {
    fn attach(&self, shell: Weak<Shell>) {
        *self.shell.lock() = shell;
    }

    fn create_window(&self, spec: &WindowSpec) -> ShellResult<WindowHandle> {
        let handle = WindowHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.state.lock().windows.insert(
            handle,
            MockWindow {
                class: spec.class,
                parent: spec.parent,
                id: spec.id,
                rect: spec.rect,
                visible: spec.visible,
            },
        );

        // native controls reach the shell only once subclassed
        if matches!(spec.class, WindowClass::Toolbar | WindowClass::Button) {
            return Ok(handle);
        }
        let Some(shell) = self.shell() else {
            return Ok(handle);
        };

        if shell.dispatch(handle, &Message::Create) == Dispatch::Handled(-1) {
            self.destroy_window(handle);
            return Err(ShellError::WindowCreation(format!(
                "{:?} create hook failed",
                spec.class
            )));
        }
        shell.dispatch(
            handle,
            &Message::Size {
                width: spec.rect.width,
                height: spec.rect.height,
            },
        );
        Ok(handle)
    }

    fn destroy_window(&self, handle: WindowHandle) {
        let children: Vec<WindowHandle> = {
            let state = self.state.lock();
            if !state.windows.contains_key(&handle) {
                return;
            }
            state
                .windows
                .iter()
                .filter(|(_, w)| w.parent == Some(handle))
                .map(|(h, _)| *h)
                .collect()
        };
        for child in children {
            self.destroy_window(child);
        }

        if let Some(shell) = self.shell() {
            shell.dispatch(handle, &Message::Destroy);
        }

        let mut state = self.state.lock();
        state.windows.remove(&handle);
        state.toolbars.remove(&handle);
        state.timers.retain(|(h, _)| *h != handle);
        drop(state);
        self.queue.lock().retain(|(h, _)| *h != handle);
    }

    fn subclass(&self, handle: WindowHandle) -> ShellResult<NativeProc> {
        if !self.window_exists(handle) {
            return Err(ShellError::Platform(format!("no window {:?}", handle)));
        }
        Ok(Self::original_proc(handle))
    }

    fn restore_proc(&self, handle: WindowHandle, original: NativeProc) {
        self.state.lock().restored.push((handle, original));
    }

    fn post_message(&self, handle: WindowHandle, msg: &Message) -> bool {
        if !self.window_exists(handle) {
            return false;
        }
        self.queue.lock().push_back((handle, msg.clone()));
        true
    }

    fn send_native(&self, handle: WindowHandle, msg: &Message) -> isize {
        self.state.lock().native_sends.push((handle, msg.clone()));
        0
    }

    fn call_chain(&self, handle: WindowHandle, chain: Chain, msg: &Message) -> isize {
        match chain {
            Chain::DefaultProc => {
                if *msg == Message::Close {
                    self.destroy_window(handle);
                }
            }
            Chain::Original(_) => self.state.lock().chained.push((handle, msg.clone())),
        }
        0
    }

    fn broadcast(&self, message_id: u32, wparam: usize) {
        self.state.lock().broadcasts.push((message_id, wparam));
    }

    fn register_window_message(&self, name: &str) -> u32 {
        let mut state = self.state.lock();
        let index = match state.registered_messages.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                state.registered_messages.push(name.to_string());
                state.registered_messages.len() - 1
            }
        };
        0xC000 + index as u32
    }

    fn screen_size(&self) -> Size {
        self.state.lock().screen
    }

    fn work_area(&self) -> Option<Rect> {
        self.state.lock().work_area
    }

    fn set_work_area(&self, area: Rect) -> bool {
        let mut state = self.state.lock();
        state.work_area = Some(area);
        state.work_area_sets.push(area);
        true
    }

    fn window_rect(&self, handle: WindowHandle) -> Rect {
        self.state
            .lock()
            .windows
            .get(&handle)
            .map(|w| w.rect)
            .unwrap_or_default()
    }

    fn client_size(&self, handle: WindowHandle) -> Size {
        let rect = self.window_rect(handle);
        Size::new(rect.width, rect.height)
    }

    fn apply_layout(&self, placements: &[Placement]) -> ShellResult<()> {
        let mut state = self.state.lock();
        for p in placements {
            if let Some(w) = state.windows.get_mut(&p.handle) {
                w.rect = p.rect;
            }
        }
        state.layouts.push(placements.to_vec());
        Ok(())
    }

    fn show_window(&self, handle: WindowHandle, cmd: ShowCommand) {
        let mut state = self.state.lock();
        state.show_calls.push((handle, cmd));
        if let Some(w) = state.windows.get_mut(&handle) {
            w.visible = cmd != ShowCommand::Hide;
        }
        if let Some(w) = state.top_level.iter_mut().find(|w| w.handle == handle) {
            match cmd {
                ShowCommand::Hide => w.visible = false,
                ShowCommand::Show | ShowCommand::ShowNoActivate => w.visible = true,
                ShowCommand::Minimize => w.minimized = true,
                ShowCommand::Maximize => {
                    w.minimized = false;
                    w.maximized = true;
                }
                ShowCommand::Restore => {
                    w.minimized = false;
                    w.maximized = false;
                }
            }
        }
    }

    fn set_timer(&self, handle: WindowHandle, id: usize, _interval_ms: u32) {
        self.state.lock().timers.insert((handle, id));
    }

    fn kill_timer(&self, handle: WindowHandle, id: usize) {
        self.state.lock().timers.remove(&(handle, id));
    }

    fn register_hotkey(&self, _handle: WindowHandle, id: i32, modifiers: u32, key: u32) -> bool {
        let mut state = self.state.lock();
        if state.hotkeys.contains_key(&id) {
            return false;
        }
        state.hotkeys.insert(id, (modifiers, key));
        true
    }

    fn unregister_hotkey(&self, _handle: WindowHandle, id: i32) {
        self.state.lock().hotkeys.remove(&id);
    }

    fn top_level_windows(&self) -> Vec<TopLevelWindow> {
        self.state.lock().top_level.clone()
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.state.lock().foreground
    }

    fn set_foreground_window(&self, handle: WindowHandle) {
        self.state.lock().foreground = Some(handle);
    }

    fn confirm_exit(&self, _owner: WindowHandle) -> bool {
        let mut state = self.state.lock();
        state.confirm_prompts += 1;
        state.confirm_answer
    }

    fn show_about(&self, _owner: WindowHandle) {
        self.state.lock().about_shown += 1;
    }

    fn show_settings(&self, _owner: WindowHandle) {
        self.state.lock().settings_shown += 1;
    }

    fn track_popup_menu(
        &self,
        _owner: WindowHandle,
        items: &[(u32, &str)],
        x: i32,
        y: i32,
    ) -> Option<u32> {
        let mut state = self.state.lock();
        state
            .popups
            .push((items.iter().map(|(id, _)| *id).collect(), x, y));
        state.popup_choice.take()
    }

    fn set_tooltip_text(&self, header: isize, text: &str) {
        self.state.lock().tooltips.push((header, text.to_string()));
    }

    fn launch(&self, target: &str) -> ShellResult<()> {
        let mut state = self.state.lock();
        if state.fail_launch {
            return Err(ShellError::Launch(target.to_string()));
        }
        state.launched.push(target.to_string());
        Ok(())
    }

    fn is_restricted(&self, restriction: Restriction) -> bool {
        self.state.lock().restrictions.contains(&restriction)
    }

    fn text_width(&self, _handle: WindowHandle, text: &str) -> i32 {
        text.chars().count() as i32 * 7
    }

    fn toolbar_add_buttons(&self, toolbar: WindowHandle, buttons: &[ToolbarButton]) {
        self.state
            .lock()
            .toolbars
            .entry(toolbar)
            .or_default()
            .extend(buttons.iter().cloned());
    }

    fn toolbar_set_pressed(&self, toolbar: WindowHandle, id: u32, pressed: bool) {
        if let Some(buttons) = self.state.lock().toolbars.get_mut(&toolbar) {
            for b in buttons.iter_mut().filter(|b| !b.separator && b.id == id) {
                b.pressed = pressed;
            }
        }
    }

    fn toolbar_button_width(&self, _toolbar: WindowHandle) -> i32 {
        self.state.lock().button_width
    }

    fn toolbar_clear(&self, toolbar: WindowHandle) {
        self.state.lock().toolbars.remove(&toolbar);
    }

    fn quit(&self, code: i32) {
        self.state.lock().quit = Some(code);
    }
}

/// Drawing request recorded by [`MockIconBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Fill,
    Icon(NativeIcon),
    ImageList(i32),
}

/// Icon backend handing out sequential fake handles
pub struct MockIconBackend {
    file_calls: AtomicUsize,
    indexed_calls: AtomicUsize,
    next: AtomicIsize,
    fail: AtomicBool,
    destroyed: Mutex<Vec<NativeIcon>>,
    destroyed_bitmaps: Mutex<Vec<NativeBitmap>>,
    draws: Mutex<Vec<DrawCall>>,
}

impl Default for MockIconBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIconBackend {
    pub const SYS_LIST: ImageList = ImageList(0x5151);

    pub fn new() -> Self {
        Self {
            file_calls: AtomicUsize::new(0),
            indexed_calls: AtomicUsize::new(0),
            next: AtomicIsize::new(1000),
            fail: AtomicBool::new(false),
            destroyed: Mutex::new(Vec::new()),
            destroyed_bitmaps: Mutex::new(Vec::new()),
            draws: Mutex::new(Vec::new()),
        }
    }

    pub fn file_icon_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    pub fn indexed_icon_calls(&self) -> usize {
        self.indexed_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_extraction(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn destroyed(&self) -> Vec<NativeIcon> {
        self.destroyed.lock().clone()
    }

    pub fn destroyed_bitmaps(&self) -> Vec<NativeBitmap> {
        self.destroyed_bitmaps.lock().clone()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.draws.lock().clone()
    }
}

impl IconBackend for MockIconBackend {
    fn file_icon(&self, _path: &str) -> Option<FileIcon> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::SeqCst) as i32;
        Some(FileIcon::SysIndex(Self::SYS_LIST, index))
    }

    fn indexed_icon(&self, _path: &str, _index: i32) -> Option<NativeIcon> {
        self.indexed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        Some(NativeIcon(self.next.fetch_add(1, Ordering::SeqCst)))
    }

    fn stock_icon(&self, id: IconId) -> Option<NativeIcon> {
        Some(NativeIcon(100 + id.0 as isize))
    }

    fn destroy_icon(&self, icon: NativeIcon) {
        self.destroyed.lock().push(icon);
    }

    fn destroy_bitmap(&self, bitmap: NativeBitmap) {
        self.destroyed_bitmaps.lock().push(bitmap);
    }

    fn fill_background(&self, _dc: DeviceContext, _rect: Rect, _background: Background) {
        self.draws.lock().push(DrawCall::Fill);
    }

    fn draw_icon(&self, _dc: DeviceContext, icon: NativeIcon, _rect: Rect, _background: Background) {
        self.draws.lock().push(DrawCall::Icon(icon));
    }

    fn draw_image_list(
        &self,
        _dc: DeviceContext,
        _list: ImageList,
        index: i32,
        _rect: Rect,
        _background: Background,
    ) {
        self.draws.lock().push(DrawCall::ImageList(index));
    }

    fn bitmap_from_icon(
        &self,
        icon: NativeIcon,
        _background: Background,
        _dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        Some(NativeBitmap(icon.0))
    }

    fn bitmap_from_image_list(
        &self,
        _list: ImageList,
        index: i32,
        _background: Background,
        _dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        Some(NativeBitmap(0x8000 + index as isize))
    }
}
