//! Decoding of tray icon notifications
//!
//! Programs announce tray icons by sending the bar a copy-data block:
//! `cookie: u32`, `message: u32`, then the icon data record. The record
//! starts with its own size, which identifies the producer's structure
//! revision and character width. Handle fields are 32 bits wide in every
//! revision.

use crate::error::{ShellError, ShellResult};
use crate::platform::{NativeIcon, WindowHandle};
use crate::utils::{narrow_to_string, wide_to_string};

pub const NIM_ADD: u32 = 0;
pub const NIM_MODIFY: u32 = 1;
pub const NIM_DELETE: u32 = 2;
pub const NIM_SETFOCUS: u32 = 3;
pub const NIM_SETVERSION: u32 = 4;

pub const NIF_MESSAGE: u32 = 0x01;
pub const NIF_ICON: u32 = 0x02;
pub const NIF_TIP: u32 = 0x04;
pub const NIF_STATE: u32 = 0x08;
pub const NIF_INFO: u32 = 0x10;
pub const NIF_GUID: u32 = 0x20;

pub const NIS_HIDDEN: u32 = 0x01;

/// Bytes before the icon data record
const HEADER_LEN: usize = 8;
/// Offset of the tip text inside the record
const TIP_OFFSET: usize = 24;
const INFO_CHARS: usize = 256;
const INFO_TITLE_CHARS: usize = 64;
const GUID_LEN: usize = 16;

/// Structure revision identified by the record size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayLayout {
    pub size: u32,
    pub wide: bool,
    pub revision: u8,
}

impl TrayLayout {
    pub fn from_size(size: u32) -> Option<Self> {
        let (wide, revision) = match size {
            88 => (false, 1),
            152 => (true, 1),
            488 => (false, 2),
            936 => (true, 2),
            504 => (false, 3),
            952 => (true, 3),
            508 => (false, 4),
            956 => (true, 4),
            _ => return None,
        };
        Some(Self {
            size,
            wide,
            revision,
        })
    }

    fn char_len(&self) -> usize {
        if self.wide {
            2
        } else {
            1
        }
    }

    fn tip_chars(&self) -> usize {
        if self.revision == 1 {
            64
        } else {
            128
        }
    }
}

/// Decoded icon data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyIconData {
    pub layout: TrayLayout,
    pub owner: WindowHandle,
    pub uid: u32,
    pub flags: u32,
    pub callback_message: u32,
    pub icon: NativeIcon,
    pub tip: String,
    pub state: u32,
    pub state_mask: u32,
    pub info: String,
    /// Balloon timeout, or the requested version for `NIM_SETVERSION`
    pub timeout_or_version: u32,
    pub info_title: String,
    pub info_flags: u32,
    pub guid: Option<[u8; GUID_LEN]>,
    pub balloon_icon: Option<NativeIcon>,
}

/// One tray request relayed to the notification area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayNotification {
    pub cookie: u32,
    pub message: u32,
    pub data: NotifyIconData,
}

struct Record<'a> {
    bytes: &'a [u8],
    layout: TrayLayout,
}

impl Record<'_> {
    fn u32_at(&self, offset: usize) -> u32 {
        read_u32(self.bytes, offset).unwrap_or(0)
    }

    fn handle_at(&self, offset: usize) -> isize {
        self.u32_at(offset) as i32 as isize
    }

    fn text_at(&self, offset: usize, chars: usize) -> String {
        let end = (offset + chars * self.layout.char_len()).min(self.bytes.len());
        let raw = &self.bytes[offset.min(end)..end];
        if self.layout.wide {
            let units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            wide_to_string(&units)
        } else {
            narrow_to_string(raw)
        }
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

impl TrayNotification {
    /// Decode a copy-data payload. Unknown record sizes and truncated
    /// payloads are rejected.
    pub fn parse(payload: &[u8]) -> ShellResult<Self> {
        let (Some(cookie), Some(message), Some(size)) = (
            read_u32(payload, 0),
            read_u32(payload, 4),
            read_u32(payload, HEADER_LEN),
        ) else {
            return Err(ShellError::TrayData(format!(
                "payload of {} bytes is too short",
                payload.len()
            )));
        };

        let layout = TrayLayout::from_size(size)
            .ok_or_else(|| ShellError::TrayData(format!("unknown icon data size {}", size)))?;
        if payload.len() < HEADER_LEN + size as usize {
            return Err(ShellError::TrayData(format!(
                "icon data truncated: {} of {} bytes",
                payload.len() - HEADER_LEN,
                size
            )));
        }

        let record = Record {
            bytes: &payload[HEADER_LEN..HEADER_LEN + size as usize],
            layout,
        };
        Ok(Self {
            cookie,
            message,
            data: NotifyIconData::decode(&record),
        })
    }
}

impl NotifyIconData {
    fn decode(r: &Record<'_>) -> Self {
        let layout = r.layout;
        let cl = layout.char_len();
        let tip_end = TIP_OFFSET + layout.tip_chars() * cl;

        let mut data = Self {
            layout,
            owner: WindowHandle(r.handle_at(4)),
            uid: r.u32_at(8),
            flags: r.u32_at(12),
            callback_message: r.u32_at(16),
            icon: NativeIcon(r.handle_at(20)),
            tip: r.text_at(TIP_OFFSET, layout.tip_chars()),
            state: 0,
            state_mask: 0,
            info: String::new(),
            timeout_or_version: 0,
            info_title: String::new(),
            info_flags: 0,
            guid: None,
            balloon_icon: None,
        };
        if layout.revision < 2 {
            return data;
        }

        let info = tip_end + 8;
        let timeout = info + INFO_CHARS * cl;
        let title = timeout + 4;
        let info_flags = title + INFO_TITLE_CHARS * cl;
        let guid = info_flags + 4;
        let balloon = guid + GUID_LEN;

        data.state = r.u32_at(tip_end);
        data.state_mask = r.u32_at(tip_end + 4);
        data.info = r.text_at(info, INFO_CHARS);
        data.timeout_or_version = r.u32_at(timeout);
        data.info_title = r.text_at(title, INFO_TITLE_CHARS);
        data.info_flags = r.u32_at(info_flags);

        if layout.revision >= 3 {
            let mut bytes = [0u8; GUID_LEN];
            bytes.copy_from_slice(&r.bytes[guid..guid + GUID_LEN]);
            data.guid = Some(bytes);
        }
        if layout.revision >= 4 {
            data.balloon_icon = Some(NativeIcon(r.handle_at(balloon)));
        }
        data
    }

    /// Whether the hidden bit is set and covered by the state mask
    pub fn is_hidden(&self) -> bool {
        self.flags & NIF_STATE != 0 && self.state_mask & NIS_HIDDEN != 0 && self.state & NIS_HIDDEN != 0
    }
}
