//! Icon cache
//!
//! Icons are stored under a numeric id and can additionally be found by the
//! path they were extracted from, or by path plus icon index. Extraction is
//! lazy: the first request for a key asks the backend, later requests return
//! the cached icon.
//!
//! The cache lock is never held while the backend runs. Two requests for the
//! same key can therefore race (a nested request from inside the backend);
//! the second insert finds the key taken and releases its duplicate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::platform::{
    Background, DeviceContext, FileIcon, IconBackend, ImageList, NativeBitmap, NativeIcon,
};
use crate::utils::Rect;

use super::icons::{Icon, IconId, IconKind, IconRepr};

/// Ids are unique for the process lifetime and never reused
static NEXT_ICON_ID: AtomicU32 = AtomicU32::new(IconId::FIRST_DYNAMIC.0);

fn next_id() -> IconId {
    IconId(NEXT_ICON_ID.fetch_add(1, Ordering::Relaxed))
}

/// Extracts icons through a shell folder object
pub trait ShellIconExtractor {
    fn extract_icon(&self, path: &str, index: i32) -> Option<NativeIcon>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IconKey {
    Path(String),
    PathIndex(String, i32),
}

#[derive(Default)]
struct CacheInner {
    icons: HashMap<IconId, Icon>,
    by_path: HashMap<String, IconId>,
    by_path_index: HashMap<(String, i32), IconId>,
    keys: HashMap<IconId, IconKey>,
    sys_image_list: Option<ImageList>,
}

impl CacheInner {
    fn find(&self, key: &IconKey) -> Option<Icon> {
        let id = match key {
            IconKey::Path(path) => self.by_path.get(path)?,
            IconKey::PathIndex(path, index) => self.by_path_index.get(&(path.clone(), *index))?,
        };
        self.icons.get(id).copied()
    }

    fn insert_key(&mut self, key: IconKey, id: IconId) {
        match &key {
            IconKey::Path(path) => {
                self.by_path.insert(path.clone(), id);
            }
            IconKey::PathIndex(path, index) => {
                self.by_path_index.insert((path.clone(), *index), id);
            }
        }
        self.keys.insert(id, key);
    }

    fn remove_key(&mut self, id: IconId) {
        match self.keys.remove(&id) {
            Some(IconKey::Path(path)) => {
                self.by_path.remove(&path);
            }
            Some(IconKey::PathIndex(path, index)) => {
                self.by_path_index.remove(&(path, index));
            }
            None => {}
        }
    }
}

/// Multi-key icon store
pub struct IconCache {
    backend: Arc<dyn IconBackend>,
    inner: Mutex<CacheInner>,
}

impl IconCache {
    /// Empty cache holding only the `UNKNOWN` and `NONE` entries
    pub fn new(backend: Arc<dyn IconBackend>) -> Self {
        let mut inner = CacheInner::default();
        inner.icons.insert(IconId::UNKNOWN, Icon::UNKNOWN);
        inner.icons.insert(
            IconId::NONE,
            Icon::new(IconId::NONE, IconRepr::Static(NativeIcon(0))),
        );
        Self {
            backend,
            inner: Mutex::new(inner),
        }
    }

    /// Load the well-known icons from the stock shell icons
    pub fn init(&self) {
        let mut loaded = 0;
        for id in IconId::STOCK_IDS {
            match self.backend.stock_icon(id) {
                Some(handle) => {
                    self.inner
                        .lock()
                        .icons
                        .insert(id, Icon::from_native(id, handle, IconKind::Static));
                    loaded += 1;
                }
                None => debug!("No stock icon for {:?}", id),
            }
        }
        info!("Loaded {} well-known icons", loaded);
    }

    /// Backend for releasing resources derived from cached icons
    pub fn backend(&self) -> Arc<dyn IconBackend> {
        self.backend.clone()
    }

    /// Icon for a file or folder, preferring the system image list
    pub fn extract(&self, path: &str) -> Icon {
        let key = IconKey::Path(path.to_string());
        if let Some(icon) = self.inner.lock().find(&key) {
            return icon;
        }

        let icon = match self.backend.file_icon(path) {
            Some(FileIcon::SysIndex(list, index)) => {
                self.inner.lock().sys_image_list.get_or_insert(list);
                Icon::new(next_id(), IconRepr::SysCache(index))
            }
            Some(FileIcon::Icon(handle)) => Icon::new(next_id(), IconRepr::Cached(handle)),
            None => {
                debug!("No icon for {}", path);
                return Icon::UNKNOWN;
            }
        };
        self.insert_keyed(key, icon)
    }

    /// Icon number `index` embedded in a file
    pub fn extract_indexed(&self, path: &str, index: i32) -> Icon {
        let key = IconKey::PathIndex(path.to_string(), index);
        if let Some(icon) = self.inner.lock().find(&key) {
            return icon;
        }

        match self.backend.indexed_icon(path, index) {
            Some(handle) => self.insert_keyed(key, Icon::new(next_id(), IconRepr::Cached(handle))),
            None => {
                debug!("No icon {} in {}", index, path);
                Icon::UNKNOWN
            }
        }
    }

    /// Icon obtained through a shell folder's extractor
    pub fn extract_with(&self, extractor: &dyn ShellIconExtractor, path: &str, index: i32) -> Icon {
        let key = IconKey::PathIndex(path.to_string(), index);
        if let Some(icon) = self.inner.lock().find(&key) {
            return icon;
        }

        match extractor.extract_icon(path, index) {
            Some(handle) => self.insert_keyed(key, Icon::new(next_id(), IconRepr::Cached(handle))),
            None => Icon::UNKNOWN,
        }
    }

    /// Store a native icon under a fresh id
    pub fn add(&self, handle: NativeIcon, kind: IconKind) -> Icon {
        let icon = Icon::from_native(next_id(), handle, kind);
        self.inner.lock().icons.insert(icon.id, icon);
        icon
    }

    /// Store a system image list index under a fresh id
    pub fn add_sys(&self, index: i32) -> Icon {
        let icon = Icon::new(next_id(), IconRepr::SysCache(index));
        self.inner.lock().icons.insert(icon.id, icon);
        icon
    }

    /// Icon for `id`, or the `UNKNOWN` sentinel
    pub fn get_icon(&self, id: IconId) -> Icon {
        self.inner
            .lock()
            .icons
            .get(&id)
            .copied()
            .unwrap_or(Icon::UNKNOWN)
    }

    /// Drop a dynamic entry and its index keys. Well-known ids stay.
    pub fn free_icon(&self, id: IconId) -> bool {
        if id.is_well_known() {
            return false;
        }
        let removed = {
            let mut inner = self.inner.lock();
            inner.remove_key(id);
            inner.icons.remove(&id)
        };
        match removed {
            Some(icon) => {
                icon.destroy(self.backend.as_ref());
                true
            }
            None => false,
        }
    }

    /// System image list learned while extracting
    pub fn sys_image_list(&self) -> Option<ImageList> {
        self.inner.lock().sys_image_list
    }

    pub fn len(&self) -> usize {
        self.inner.lock().icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paint a cached icon
    pub fn draw(&self, icon: &Icon, dc: DeviceContext, rect: Rect, background: Background) {
        icon.draw(self.backend.as_ref(), self.sys_image_list(), dc, rect, background);
    }

    /// Render a cached icon into a bitmap
    pub fn create_bitmap(
        &self,
        icon: &Icon,
        background: Background,
        dc: DeviceContext,
    ) -> Option<NativeBitmap> {
        icon.create_bitmap(self.backend.as_ref(), self.sys_image_list(), background, dc)
    }

    /// Release every extracted and added icon; well-known entries stay
    pub fn clear(&self) {
        let released: Vec<Icon> = {
            let mut inner = self.inner.lock();
            inner.by_path.clear();
            inner.by_path_index.clear();
            inner.keys.clear();
            let dynamic: Vec<IconId> = inner
                .icons
                .keys()
                .copied()
                .filter(|id| !id.is_well_known())
                .collect();
            dynamic
                .into_iter()
                .filter_map(|id| inner.icons.remove(&id))
                .collect()
        };
        for icon in &released {
            icon.destroy(self.backend.as_ref());
        }
        debug!("Icon cache cleared, {} entries released", released.len());
    }

    fn insert_keyed(&self, key: IconKey, icon: Icon) -> Icon {
        let existing = {
            let mut inner = self.inner.lock();
            match inner.find(&key) {
                Some(existing) => Some(existing),
                None => {
                    inner.icons.insert(icon.id, icon);
                    inner.insert_key(key, icon.id);
                    None
                }
            }
        };

        match existing {
            Some(existing) => {
                if let Some(handle) = icon.native() {
                    self.backend.destroy_icon(handle);
                }
                existing
            }
            None => icon,
        }
    }
}
