//! Configuration management for ShellBar
//!
//! Handles loading, saving, and managing user preferences and settings.

use anyhow::Result;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General application settings
    pub general: GeneralConfig,
    /// Desktop bar geometry
    pub bar: BarConfig,
    /// Quick launch toolbar
    pub quick_launch: QuickLaunchConfig,
    /// Notification area
    pub notify: NotifyConfig,
    /// Behavior settings
    pub behavior: BehaviorConfig,
    /// Hotkey configurations
    pub hotkeys: HotkeyConfig,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellbar")
            .join("config.toml")
    }

    /// Load configuration from file or create default
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path())
    }

    /// Load from `path`; a missing file is created with defaults, an
    /// unreadable one is replaced by defaults in memory only
    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from: {:?}", path);
            let content = std::fs::read_to_string(path)?;
            match toml::from_str(&content) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to parse config, using defaults: {}", e);
                    return Ok(Self::default());
                }
            }
        }

        let config = Self::default();
        config.save_to(path)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to: {:?}", path);
        Ok(())
    }

    /// Folder scanned by the quick launch toolbar
    pub fn quick_launch_folder(&self) -> PathBuf {
        match &self.quick_launch.folder {
            Some(folder) => folder.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Microsoft")
                .join("Internet Explorer")
                .join("Quick Launch"),
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Command opened by the explore button and Win+E
    pub explorer_command: String,
    /// Command opened by the task manager entry
    pub taskmgr_command: String,
}

impl GeneralConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            explorer_command: "explorer.exe".to_string(),
            taskmgr_command: "taskmgr.exe".to_string(),
        }
    }
}

/// Bar position enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BarPosition {
    Top,
    Bottom,
}

/// Desktop bar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Bar height in pixels
    pub height: i32,
    /// Screen edge the bar docks to
    pub position: BarPosition,
    /// Start button caption
    pub start_label: String,
    /// Extra width around the start button caption and icon
    pub start_button_padding: i32,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            height: 28,
            position: BarPosition::Bottom,
            start_label: "Start".to_string(),
            start_button_padding: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickLaunchConfig {
    /// Folder override; defaults to the per-user Quick Launch folder
    pub folder: Option<PathBuf>,
    pub create_if_missing: bool,
    /// Horizontal distance between buttons when the toolbar cannot
    /// report its button size
    pub button_distance: i32,
}

impl Default for QuickLaunchConfig {
    fn default() -> Self {
        Self {
            folder: None,
            create_if_missing: true,
            button_distance: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Skip the notification area when policy hides tray items
    pub respect_restrictions: bool,
    pub min_width: i32,
    /// Horizontal distance between tray icons
    pub icon_spacing: i32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            respect_restrictions: true,
            min_width: 40,
            icon_spacing: 20,
        }
    }
}

/// Behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Ask before closing the bar
    pub confirm_exit: bool,
    /// Keep maximized windows clear of the bar
    pub reserve_work_area: bool,
    /// Announce the bar to running programs after creation
    pub broadcast_taskbar_created: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            confirm_exit: true,
            reserve_work_area: true,
            broadcast_taskbar_created: true,
        }
    }
}

/// Hotkey configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Open the file manager
    pub show_explorer: Option<String>,
    pub toggle_start_menu: Option<String>,
    pub minimize_all: Option<String>,
    /// Enable Win+1..Win+4 desktop switching
    pub switch_desktops: bool,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            show_explorer: Some("Win+E".to_string()),
            toggle_start_menu: None,
            minimize_all: None,
            switch_desktops: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn toml_roundtrip_default() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&s).expect("parse");
        assert_eq!(cfg.general.log_level, parsed.general.log_level);
        assert_eq!(cfg.bar.height, parsed.bar.height);
        assert_eq!(cfg.bar.position, parsed.bar.position);
        assert_eq!(cfg.hotkeys.show_explorer, parsed.hotkeys.show_explorer);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[behavior]\nconfirm_exit = false\n").expect("parse");
        assert!(!parsed.behavior.confirm_exit);
        assert!(parsed.behavior.reserve_work_area);
        assert_eq!(parsed.quick_launch.button_distance, 20);
    }

    #[test]
    fn config_path_ends_with_shellbar_file() {
        let p = Config::config_path();
        let s = p.to_string_lossy();
        assert!(
            s.ends_with("shellbar/config.toml") || s.ends_with("shellbar\\config.toml"),
            "config path does not end with shellbar/config.toml: {}",
            s
        );
    }

    #[test]
    fn save_and_load_or_default_reads_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.general.log_level = "debug".to_string();
        cfg.bar.position = BarPosition::Top;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_or_default_from(&path).expect("load");
        assert_eq!(loaded.general.level_filter(), LevelFilter::Debug);
        assert_eq!(loaded.bar.position, BarPosition::Top);
    }

    #[test]
    fn missing_file_is_created_and_garbage_falls_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");

        Config::load_or_default_from(&path).expect("create");
        assert!(path.exists());

        fs::write(&path, "this is = = not toml").unwrap();
        let loaded = Config::load_or_default_from(&path).expect("fallback");
        assert_eq!(loaded.general.log_level, "info");
    }

    #[test]
    fn quick_launch_folder_override() {
        let mut cfg = Config::default();
        cfg.quick_launch.folder = Some(PathBuf::from("/tmp/ql"));
        assert_eq!(cfg.quick_launch_folder(), PathBuf::from("/tmp/ql"));

        cfg.quick_launch.folder = None;
        assert!(cfg.quick_launch_folder().ends_with("Quick Launch"));
    }

    #[test]
    fn unknown_log_level_defaults_to_info() {
        let mut general = GeneralConfig::default();
        general.log_level = "chatty".to_string();
        assert_eq!(general.level_filter(), LevelFilter::Info);
    }
}
