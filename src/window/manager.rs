//! Window creation, subclassing and messaging on top of the registry

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::{ShellError, ShellResult};
use crate::platform::{WindowHandle, WindowSpec};
use crate::shell::{ControllerFactory, Shell};

use super::controller::Controller;
use super::message::Message;
use super::proc::Dispatch;
use super::registry::{Chain, ControllerRef};

impl Shell {
    /// Create a window whose behavior is provided by the controller `make`
    /// builds.
    ///
    /// The factory waits in the pending-creator slot until the first message
    /// for the new handle arrives; at that point the controller is built,
    /// registered and sees the creation message.
    pub fn create_window<C, F>(&self, spec: &WindowSpec, make: F) -> ShellResult<WindowHandle>
    where
        C: Controller,
        F: FnOnce(WindowHandle, &Shell) -> C + Send + 'static,
    {
        let factory: ControllerFactory = Box::new(move |handle: WindowHandle, shell: &Shell| {
            let controller: ControllerRef = Arc::new(Mutex::new(make(handle, shell)));
            controller
        });

        let slot = self.creator.lock();
        if slot.borrow_mut().replace(factory).is_some() {
            warn!("Pending creator replaced before it was consumed");
        }

        let created = self.platform.create_window(spec);

        if slot.borrow_mut().take().is_some() {
            debug!("{:?} creation delivered no message, factory discarded", spec.class);
        }
        drop(slot);

        let handle = created?;
        if !self.registry.contains(handle) {
            return Err(ShellError::WindowCreation(format!(
                "{:?} window has no controller after creation",
                spec.class
            )));
        }
        Ok(handle)
    }

    /// Attach `controller` to a window the OS created.
    ///
    /// The shell window procedure replaces the native one; messages the
    /// controller does not handle are passed on to the original procedure.
    pub fn subclass<C: Controller>(&self, handle: WindowHandle, controller: C) -> ShellResult<()> {
        if self.registry.contains(handle) {
            return Err(ShellError::AlreadyRegistered(handle));
        }

        let original = self.platform.subclass(handle)?;
        let controller: ControllerRef = Arc::new(Mutex::new(controller));
        if !self.registry.register(handle, controller, Chain::Original(original)) {
            self.platform.restore_proc(handle, original);
            return Err(ShellError::AlreadyRegistered(handle));
        }
        Ok(())
    }

    /// Destroy a window; its controller is released by the destroy notification
    pub fn destroy_window(&self, handle: WindowHandle) {
        self.platform.destroy_window(handle);
    }

    /// Synchronously deliver `msg` to `handle`.
    ///
    /// A message the controller leaves unhandled continues down its chain
    /// once the controller is released.
    pub fn send(&self, handle: WindowHandle, msg: &Message) -> isize {
        if handle.is_null() {
            return 0;
        }
        if self.registry.contains(handle) {
            match self.dispatch(handle, msg) {
                Dispatch::Handled(value) => value,
                Dispatch::Default(chain) => self.platform.call_chain(handle, chain, msg),
            }
        } else {
            self.platform.send_native(handle, msg)
        }
    }

    /// Queue `msg` for `handle`
    pub fn post(&self, handle: WindowHandle, msg: &Message) -> bool {
        !handle.is_null() && self.platform.post_message(handle, msg)
    }

    /// Run `f` on the controller of `handle` if it is a `T` and not busy
    pub fn with_controller<T, R>(&self, handle: WindowHandle, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Controller,
    {
        let controller = self.registry.lookup(handle)?;
        let mut guard = controller.try_lock()?;
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }
}
