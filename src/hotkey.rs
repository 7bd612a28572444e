//! Hotkey system for ShellBar
//!
//! Handles global hotkey registration and processing.

use log::{debug, info, warn};
use std::collections::HashMap;

use crate::config::HotkeyConfig;
use crate::desktops::DESKTOP_COUNT;
use crate::error::{ShellError, ShellResult};
use crate::platform::{Platform, WindowHandle};

pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;

/// Id of the Win+E hotkey, fixed for compatibility with the stock shell
pub const HOTKEY_SHOW_EXPLORER: i32 = 0;

/// Hotkey action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    ShowExplorer,
    ToggleStartMenu,
    MinimizeAll,
    SwitchDesktop(usize),
}

/// Parsed hotkey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: u32,
    pub key: u32,
    pub action: HotkeyAction,
}

impl Hotkey {
    /// Parse a hotkey string like "Win+E" or "Ctrl+Shift+S"
    pub fn parse(s: &str, action: HotkeyAction) -> Option<Self> {
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut modifiers = 0u32;
        let mut key = 0u32;

        for (i, part) in parts.iter().enumerate() {
            let part_upper = part.to_uppercase();

            if i == parts.len() - 1 {
                // Last part is the key
                key = Self::parse_key(&part_upper)?;
            } else {
                match part_upper.as_str() {
                    "ALT" => modifiers |= MOD_ALT,
                    "CTRL" | "CONTROL" => modifiers |= MOD_CONTROL,
                    "SHIFT" => modifiers |= MOD_SHIFT,
                    "WIN" | "WINDOWS" | "SUPER" => modifiers |= MOD_WIN,
                    _ => return None,
                }
            }
        }

        Some(Self {
            modifiers,
            key,
            action,
        })
    }

    /// Parse a key name to virtual key code
    fn parse_key(s: &str) -> Option<u32> {
        // Single character keys
        if s.len() == 1 {
            let c = s.chars().next()?;
            if c.is_ascii_alphanumeric() {
                return Some(c.to_ascii_uppercase() as u32);
            }
        }

        match s {
            "SPACE" => Some(0x20),
            "ENTER" | "RETURN" => Some(0x0D),
            "TAB" => Some(0x09),
            "ESCAPE" | "ESC" => Some(0x1B),
            "HOME" => Some(0x24),
            "END" => Some(0x23),
            "F1" => Some(0x70),
            "F2" => Some(0x71),
            "F3" => Some(0x72),
            "F4" => Some(0x73),
            "F5" => Some(0x74),
            "F6" => Some(0x75),
            "F7" => Some(0x76),
            "F8" => Some(0x77),
            "F9" => Some(0x78),
            "F10" => Some(0x79),
            "F11" => Some(0x7A),
            "F12" => Some(0x7B),
            _ => None,
        }
    }
}

/// Hotkeys registered for one window
#[derive(Debug)]
pub struct HotkeyManager {
    owner: WindowHandle,
    hotkeys: HashMap<i32, Hotkey>,
    next_id: i32,
}

impl HotkeyManager {
    pub fn new(owner: WindowHandle) -> Self {
        Self {
            owner,
            hotkeys: HashMap::new(),
            next_id: HOTKEY_SHOW_EXPLORER + 1,
        }
    }

    /// Register a hotkey
    pub fn register(&mut self, platform: &dyn Platform, hotkey: Hotkey) -> ShellResult<i32> {
        let id = if hotkey.action == HotkeyAction::ShowExplorer {
            HOTKEY_SHOW_EXPLORER
        } else {
            let id = self.next_id;
            self.next_id += 1;
            id
        };

        if platform.register_hotkey(self.owner, id, hotkey.modifiers, hotkey.key) {
            info!("Registered hotkey {} for {:?}", id, hotkey.action);
            self.hotkeys.insert(id, hotkey);
            Ok(id)
        } else {
            warn!("Failed to register hotkey for {:?}", hotkey.action);
            Err(ShellError::Platform(format!(
                "hotkey for {:?} is taken",
                hotkey.action
            )))
        }
    }

    /// Register a hotkey from string
    pub fn register_from_string(
        &mut self,
        platform: &dyn Platform,
        s: &str,
        action: HotkeyAction,
    ) -> ShellResult<i32> {
        let hotkey = Hotkey::parse(s, action)
            .ok_or_else(|| ShellError::Config(format!("Invalid hotkey string: {}", s)))?;
        self.register(platform, hotkey)
    }

    /// Unregister all hotkeys
    pub fn unregister_all(&mut self, platform: &dyn Platform) {
        for id in self.hotkeys.drain().map(|(id, _)| id) {
            platform.unregister_hotkey(self.owner, id);
            debug!("Unregistered hotkey {}", id);
        }
    }

    /// Action bound to a `WM_HOTKEY` id
    pub fn action(&self, id: i32) -> Option<HotkeyAction> {
        self.hotkeys.get(&id).map(|h| h.action)
    }

    pub fn len(&self) -> usize {
        self.hotkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotkeys.is_empty()
    }
}

/// Register default hotkeys from config
pub fn register_default_hotkeys(
    manager: &mut HotkeyManager,
    platform: &dyn Platform,
    config: &HotkeyConfig,
) {
    let bindings = [
        (&config.show_explorer, HotkeyAction::ShowExplorer),
        (&config.toggle_start_menu, HotkeyAction::ToggleStartMenu),
        (&config.minimize_all, HotkeyAction::MinimizeAll),
    ];
    for (key, action) in bindings {
        if let Some(key) = key {
            if let Err(e) = manager.register_from_string(platform, key, action) {
                warn!("Failed to register {:?} hotkey: {}", action, e);
            }
        }
    }

    if config.switch_desktops {
        for index in 0..DESKTOP_COUNT {
            let hotkey = Hotkey {
                modifiers: MOD_WIN,
                key: '1' as u32 + index as u32,
                action: HotkeyAction::SwitchDesktop(index),
            };
            if let Err(e) = manager.register(platform, hotkey) {
                warn!("Failed to register desktop {} hotkey: {}", index + 1, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;

    #[test]
    fn parse_modifiers_and_key() {
        let hk = Hotkey::parse("Win+E", HotkeyAction::ShowExplorer).unwrap();
        assert_eq!(hk.modifiers, MOD_WIN);
        assert_eq!(hk.key, 'E' as u32);

        let hk = Hotkey::parse("ctrl + shift + f5", HotkeyAction::MinimizeAll).unwrap();
        assert_eq!(hk.modifiers, MOD_CONTROL | MOD_SHIFT);
        assert_eq!(hk.key, 0x74);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Hotkey::parse("Hyper+E", HotkeyAction::ShowExplorer).is_none());
        assert!(Hotkey::parse("Win+", HotkeyAction::ShowExplorer).is_none());
        assert!(Hotkey::parse("Win+Banana", HotkeyAction::ShowExplorer).is_none());
    }

    #[test]
    fn explorer_hotkey_uses_id_zero() {
        let platform = MockPlatform::new();
        let mut manager = HotkeyManager::new(WindowHandle(1));
        let config = HotkeyConfig {
            toggle_start_menu: Some("Ctrl+Esc".to_string()),
            switch_desktops: true,
            ..HotkeyConfig::default()
        };
        register_default_hotkeys(&mut manager, &platform, &config);

        assert_eq!(manager.action(0), Some(HotkeyAction::ShowExplorer));
        assert_eq!(platform.hotkeys().get(&0), Some(&(MOD_WIN, 'E' as u32)));
        assert_eq!(manager.len(), 6);
        assert_eq!(manager.action(1), Some(HotkeyAction::ToggleStartMenu));
        assert_eq!(manager.action(2), Some(HotkeyAction::SwitchDesktop(0)));

        manager.unregister_all(&platform);
        assert!(manager.is_empty());
        assert!(platform.hotkeys().is_empty());
    }

    #[test]
    fn taken_hotkey_is_reported() {
        let platform = MockPlatform::new();
        let mut first = HotkeyManager::new(WindowHandle(1));
        let mut second = HotkeyManager::new(WindowHandle(2));
        assert!(first
            .register_from_string(&platform, "Win+E", HotkeyAction::ShowExplorer)
            .is_ok());
        assert!(second
            .register_from_string(&platform, "Win+E", HotkeyAction::ShowExplorer)
            .is_err());
        assert!(second.is_empty());
    }
}
