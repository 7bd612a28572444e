//! Custom error types for the ShellBar application

use thiserror::Error;

use crate::platform::WindowHandle;

/// Main error type for ShellBar operations
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    #[error("Handle {0:?} is already bound to a controller")]
    AlreadyRegistered(WindowHandle),

    #[error("Controller initialization failed: {0}")]
    ControllerInit(String),

    #[error("Desktop index {0} is out of range")]
    DesktopOutOfRange(usize),

    #[error("Tray notification rejected: {0}")]
    TrayData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Launch failed: {0}")]
    Launch(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ShellBar operations
pub type ShellResult<T> = Result<T, ShellError>;
