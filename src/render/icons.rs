//! Icon values handed out by the icon cache
//!
//! An [`Icon`] is a small copyable value: the cache id plus how the image is
//! held. Drawing and bitmap conversion go through the [`IconBackend`].

use crate::platform::{
    Background, DeviceContext, IconBackend, ImageList, NativeBitmap, NativeIcon,
};
use crate::utils::Rect;

/// Icon cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconId(pub u32);

impl IconId {
    pub const UNKNOWN: IconId = IconId(0);
    pub const NONE: IconId = IconId(1);
    pub const FOLDER: IconId = IconId(2);
    pub const APP: IconId = IconId(3);
    pub const EXPLORER: IconId = IconId(4);
    pub const CONFIG: IconId = IconId(5);
    pub const DOCUMENTS: IconId = IconId(6);
    pub const FAVORITES: IconId = IconId(7);
    pub const INFO: IconId = IconId(8);
    pub const APPS: IconId = IconId(9);
    pub const SEARCH: IconId = IconId(10);
    pub const ACTION: IconId = IconId(11);
    pub const SEARCH_DOC: IconId = IconId(12);
    pub const PRINTER: IconId = IconId(13);
    pub const NETWORK: IconId = IconId(14);
    pub const COMPUTER: IconId = IconId(15);
    pub const LOGOFF: IconId = IconId(16);

    /// First id handed out for extracted or added icons
    pub const FIRST_DYNAMIC: IconId = IconId(17);

    /// Ids loaded from the stock shell icons
    pub const STOCK_IDS: [IconId; 15] = [
        IconId::FOLDER,
        IconId::APP,
        IconId::EXPLORER,
        IconId::CONFIG,
        IconId::DOCUMENTS,
        IconId::FAVORITES,
        IconId::INFO,
        IconId::APPS,
        IconId::SEARCH,
        IconId::ACTION,
        IconId::SEARCH_DOC,
        IconId::PRINTER,
        IconId::NETWORK,
        IconId::COMPUTER,
        IconId::LOGOFF,
    ];

    pub fn is_well_known(self) -> bool {
        self < IconId::FIRST_DYNAMIC
    }
}

/// Ownership class of an icon handle added to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    /// Stock icon, lives for the whole process
    Static,
    /// Extracted from a file, shared through the cache
    Cached,
    /// Owned by the cache and destroyed with the entry
    Dynamic,
}

/// How the image of an icon is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRepr {
    Static(NativeIcon),
    Cached(NativeIcon),
    Dynamic(NativeIcon),
    /// Index into the system image list
    SysCache(i32),
}

/// Cached icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub id: IconId,
    pub repr: IconRepr,
}

impl Icon {
    /// Sentinel returned for lookups that miss
    pub const UNKNOWN: Icon = Icon {
        id: IconId::UNKNOWN,
        repr: IconRepr::Static(NativeIcon(0)),
    };

    pub fn new(id: IconId, repr: IconRepr) -> Self {
        Self { id, repr }
    }

    pub fn from_native(id: IconId, icon: NativeIcon, kind: IconKind) -> Self {
        let repr = match kind {
            IconKind::Static => IconRepr::Static(icon),
            IconKind::Cached => IconRepr::Cached(icon),
            IconKind::Dynamic => IconRepr::Dynamic(icon),
        };
        Self { id, repr }
    }

    /// Native handle, if the icon owns one
    pub fn native(&self) -> Option<NativeIcon> {
        match self.repr {
            IconRepr::Static(h) | IconRepr::Cached(h) | IconRepr::Dynamic(h) if h.0 != 0 => Some(h),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == IconId::UNKNOWN
    }

    /// Release the native handle if this icon owns it
    pub fn destroy(&self, backend: &dyn IconBackend) {
        if let IconRepr::Dynamic(h) = self.repr {
            if h.0 != 0 {
                backend.destroy_icon(h);
            }
        }
    }

    /// Paint the icon into `rect`, filling the background first
    pub fn draw(
        &self,
        backend: &dyn IconBackend,
        sys_list: Option<ImageList>,
        dc: DeviceContext,
        rect: Rect,
        background: Background,
    ) {
        match (self.repr, sys_list) {
            (IconRepr::SysCache(index), Some(list)) => {
                backend.draw_image_list(dc, list, index, rect, background)
            }
            _ => match self.native() {
                Some(h) => backend.draw_icon(dc, h, rect, background),
                None => backend.fill_background(dc, rect, background),
            },
        }
    }

    /// Render the icon into a new bitmap compatible with `dc`
    pub fn create_bitmap(
        &self,
        backend: &dyn IconBackend,
        sys_list: Option<ImageList>,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        match (self.repr, sys_list) {
            (IconRepr::SysCache(index), Some(list)) => {
                backend.bitmap_from_image_list(list, index, background, dc)
            }
            _ => backend.bitmap_from_icon(self.native()?, background, dc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{DrawCall, MockIconBackend};
    use crate::platform::ColorRef;

    fn bg() -> Background {
        Background {
            color: ColorRef(0xFFFFFF),
            brush: None,
        }
    }

    #[test]
    fn well_known_ids_are_below_first_dynamic() {
        assert!(IconId::LOGOFF.is_well_known());
        assert!(!IconId::FIRST_DYNAMIC.is_well_known());
        assert_eq!(IconId::STOCK_IDS.len() as u32 + 2, IconId::FIRST_DYNAMIC.0);
    }

    #[test]
    fn only_dynamic_icons_release_their_handle() {
        let backend = MockIconBackend::new();
        Icon::from_native(IconId(20), NativeIcon(5), IconKind::Static).destroy(&backend);
        Icon::from_native(IconId(21), NativeIcon(6), IconKind::Cached).destroy(&backend);
        Icon::from_native(IconId(22), NativeIcon(7), IconKind::Dynamic).destroy(&backend);
        assert_eq!(backend.destroyed(), vec![NativeIcon(7)]);
    }

    #[test]
    fn draw_picks_the_path_for_each_kind() {
        let backend = MockIconBackend::new();
        let dc = DeviceContext(1);
        let rect = Rect::new(0, 0, 16, 16);

        Icon::new(IconId(30), IconRepr::SysCache(4)).draw(&backend, Some(ImageList(9)), dc, rect, bg());
        Icon::new(IconId(31), IconRepr::Cached(NativeIcon(3))).draw(&backend, None, dc, rect, bg());
        Icon::UNKNOWN.draw(&backend, None, dc, rect, bg());

        assert_eq!(
            backend.draws(),
            vec![DrawCall::ImageList(4), DrawCall::Icon(NativeIcon(3)), DrawCall::Fill]
        );
    }

    #[test]
    fn unknown_icon_has_no_bitmap() {
        let backend = MockIconBackend::new();
        assert!(Icon::UNKNOWN.create_bitmap(&backend, None, bg(), DeviceContext(0)).is_none());
        let icon = Icon::new(IconId(40), IconRepr::Dynamic(NativeIcon(8)));
        assert!(icon.create_bitmap(&backend, None, bg(), DeviceContext(0)).is_some());
    }
}
