//! Utility functions and helpers for ShellBar

/// Convert a Rust string to a wide string for Windows API
#[cfg(windows)]
pub fn to_wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Create a PCWSTR from a wide string slice
#[cfg(windows)]
pub fn to_pcwstr(s: &[u16]) -> windows::core::PCWSTR {
    windows::core::PCWSTR::from_raw(s.as_ptr())
}

/// Low word of a message parameter
pub fn loword(value: usize) -> u32 {
    (value & 0xFFFF) as u32
}

/// High word of a message parameter
pub fn hiword(value: usize) -> u32 {
    ((value >> 16) & 0xFFFF) as u32
}

/// Decode a NUL-terminated UTF-16 buffer, lossy
pub fn wide_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Decode a NUL-terminated narrow (ANSI) buffer, lossy
pub fn narrow_to_string(buf: &[u8]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Rectangle structure for layout calculations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from left/top/right/bottom edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Size structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}
