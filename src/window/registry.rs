//! Handle-to-controller registry
//!
//! Maps native window handles to the controller that owns their behavior.
//! The registry is the only owner of a controller: an entry is created when
//! the window is created (or subclassed) and removed by the destroy
//! notification. The removed entry is handed back to the caller so the
//! controller is dropped after the map lock has been released.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::platform::{NativeProc, WindowHandle};

use super::controller::Controller;

/// Shared reference to a registered controller
pub type ControllerRef = Arc<Mutex<dyn Controller>>;

/// What to do with messages a controller leaves unhandled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    /// Window created by the shell: default window procedure
    DefaultProc,
    /// Subclassed window: procedure that was installed before
    Original(NativeProc),
}

/// One registered window
pub struct ControllerEntry {
    pub controller: ControllerRef,
    pub chain: Chain,
}

/// Process-wide handle registry, guarded by one lock
#[derive(Default)]
pub struct HandleRegistry {
    map: Mutex<HashMap<WindowHandle, ControllerEntry>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `controller` to `handle`.
    ///
    /// Returns `false` and leaves the map untouched if the handle already
    /// has a controller.
    pub fn register(&self, handle: WindowHandle, controller: ControllerRef, chain: Chain) -> bool {
        let mut map = self.map.lock();
        if map.contains_key(&handle) {
            warn!("Handle {:?} is already registered, rejecting new controller", handle);
            return false;
        }
        map.insert(handle, ControllerEntry { controller, chain });
        debug!("Registered controller for {:?} ({:?})", handle, chain);
        true
    }

    /// Controller bound to `handle`
    pub fn lookup(&self, handle: WindowHandle) -> Option<ControllerRef> {
        self.map.lock().get(&handle).map(|e| e.controller.clone())
    }

    /// Controller and chain bound to `handle`
    pub fn lookup_entry(&self, handle: WindowHandle) -> Option<(ControllerRef, Chain)> {
        self.map
            .lock()
            .get(&handle)
            .map(|e| (e.controller.clone(), e.chain))
    }

    /// Remove the binding for `handle`. The caller drops the returned entry.
    pub fn unregister(&self, handle: WindowHandle) -> Option<ControllerEntry> {
        let removed = self.map.lock().remove(&handle);
        if removed.is_some() {
            debug!("Unregistered controller for {:?}", handle);
        }
        removed
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.map.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every entry out of the map (shell teardown)
    pub fn drain(&self) -> Vec<(WindowHandle, ControllerEntry)> {
        self.map.lock().drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Shell;
    use crate::window::{Message, Reply};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tagged {
        tag: u32,
        drops: Arc<AtomicUsize>,
    }

    impl Controller for Tagged {
        fn window_proc(&mut self, _msg: &Message, _shell: &Shell) -> Reply {
            Reply::Handled(self.tag as isize)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Drop for Tagged {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tagged(tag: u32, drops: &Arc<AtomicUsize>) -> ControllerRef {
        Arc::new(Mutex::new(Tagged {
            tag,
            drops: drops.clone(),
        }))
    }

    fn tag_of(c: &ControllerRef) -> u32 {
        c.lock().as_any().downcast_ref::<Tagged>().map(|p| p.tag).unwrap()
    }

    #[test]
    fn register_then_lookup_then_unregister() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = HandleRegistry::new();
        let h = WindowHandle(0x1234);

        assert!(registry.register(h, tagged(7, &drops), Chain::DefaultProc));
        assert_eq!(tag_of(&registry.lookup(h).unwrap()), 7);

        let entry = registry.unregister(h).expect("entry");
        assert!(registry.lookup(h).is_none());
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(entry);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn double_registration_keeps_first_controller() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = HandleRegistry::new();
        let h = WindowHandle(42);

        assert!(registry.register(h, tagged(1, &drops), Chain::DefaultProc));
        assert!(!registry.register(h, tagged(2, &drops), Chain::Original(NativeProc(9))));

        // the rejected controller was dropped, the first one is intact
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        let (c, chain) = registry.lookup_entry(h).unwrap();
        assert_eq!(tag_of(&c), 1);
        assert_eq!(chain, Chain::DefaultProc);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_handles_are_not_found() {
        let registry = HandleRegistry::new();
        assert!(registry.lookup(WindowHandle(5)).is_none());
        assert!(registry.unregister(WindowHandle(5)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn drain_empties_the_map() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = HandleRegistry::new();
        registry.register(WindowHandle(1), tagged(1, &drops), Chain::DefaultProc);
        registry.register(WindowHandle(2), tagged(2, &drops), Chain::DefaultProc);

        let drained = registry.drain();
        let mut handles: Vec<WindowHandle> = drained.iter().map(|(h, _)| *h).collect();
        handles.sort();
        assert_eq!(handles, vec![WindowHandle(1), WindowHandle(2)]);
        assert!(registry.is_empty());
        drop(drained);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registration_is_safe_from_two_threads() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(HandleRegistry::new());
        let shared = WindowHandle(0x7777);

        let workers: Vec<_> = (0..2u32)
            .map(|t| {
                let registry = registry.clone();
                let drops = drops.clone();
                std::thread::spawn(move || {
                    let won = registry.register(shared, tagged(t, &drops), Chain::DefaultProc);
                    for i in 0..500isize {
                        let h = WindowHandle(((t as isize + 1) << 16) + i);
                        assert!(registry.register(h, tagged(t, &drops), Chain::DefaultProc));
                        assert!(registry.lookup(h).is_some());
                        if i % 2 == 0 {
                            drop(registry.unregister(h));
                        }
                    }
                    won
                })
            })
            .collect();
        let wins = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(|won| *won)
            .count();

        // one thread owns the shared handle; the other's controller was dropped
        assert_eq!(wins, 1);
        assert_eq!(registry.len(), 1 + 2 * 250);
        assert_eq!(drops.load(Ordering::SeqCst), 1 + 2 * 250);
    }
}
