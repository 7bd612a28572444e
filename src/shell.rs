//! Shell context
//!
//! [`Shell`] is the one object every controller hook receives. It owns the
//! handle registry, the pending-creator slot, the icon cache, the virtual
//! desktops and the configuration, and it talks to the operating system
//! through the platform traits. It is built once at startup (`Shell::new`)
//! and torn down explicitly (`Shell::teardown`) after the message loop ends.

use std::cell::RefCell;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};

use crate::config::Config;
use crate::desktops::Desktops;
use crate::platform::{IconBackend, Platform, WindowHandle};
use crate::render::icon_cache::IconCache;
use crate::window::message::WINMSG_TASKBARCREATED;
use crate::window::registry::{Chain, ControllerRef, HandleRegistry};

/// Builds the controller for a window whose creation is in progress
pub type ControllerFactory = Box<dyn FnOnce(WindowHandle, &Shell) -> ControllerRef + Send>;

/// Process-wide shell state shared by all controllers
pub struct Shell {
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) registry: HandleRegistry,
    /// Factory for the window currently being created. The lock is
    /// re-entrant so a controller may create child windows from `on_create`.
    pub(crate) creator: ReentrantMutex<RefCell<Option<ControllerFactory>>>,
    icons: IconCache,
    desktops: Mutex<Desktops>,
    config: Arc<Config>,
    taskbar_created: u32,
}

impl Shell {
    /// Build the shell context and attach it to the platform's window procedure.
    ///
    /// Initialization order: registered messages, icon cache (well-known
    /// icons), desktops, then the platform hook.
    pub fn new(
        platform: Arc<dyn Platform>,
        icon_backend: Arc<dyn IconBackend>,
        config: Arc<Config>,
    ) -> Arc<Self> {
        let taskbar_created = platform.register_window_message(WINMSG_TASKBARCREATED);

        let icons = IconCache::new(icon_backend);
        icons.init();

        let shell = Arc::new(Self {
            platform,
            registry: HandleRegistry::new(),
            creator: ReentrantMutex::new(RefCell::new(None)),
            icons,
            desktops: Mutex::new(Desktops::new()),
            config,
            taskbar_created,
        });

        shell.platform.attach(Arc::downgrade(&shell));
        info!("Shell context initialized");
        shell
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    pub fn desktops(&self) -> MutexGuard<'_, Desktops> {
        self.desktops.lock()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Numeric id of the registered "TaskbarCreated" broadcast
    pub fn taskbar_created_message(&self) -> u32 {
        self.taskbar_created
    }

    /// Whether a window belongs to the shell itself
    pub fn owns_window(&self, handle: WindowHandle) -> bool {
        self.registry.contains(handle)
    }

    /// Release every controller still registered and the cached icons.
    ///
    /// Called once after the message loop has ended.
    pub fn teardown(&self) {
        let remaining = self.registry.drain();
        if !remaining.is_empty() {
            debug!("Releasing {} controllers at teardown", remaining.len());
        }
        for (handle, entry) in &remaining {
            if let Chain::Original(original) = entry.chain {
                self.platform.restore_proc(*handle, original);
            }
        }
        drop(remaining);

        self.icons.clear();
        info!("Shell context torn down");
    }
}
