//! Message dispatch into controllers
//!
//! The platform window procedure decodes a native message and hands it to
//! [`Shell::dispatch`]. The returned [`Dispatch`] tells the platform whether
//! to return a value or to continue with the default or original procedure.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, warn};

use crate::error::ShellResult;
use crate::platform::WindowHandle;
use crate::shell::Shell;

use super::controller::Reply;
use super::message::Message;
use super::registry::{Chain, ControllerRef};

/// Outcome of dispatching one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Return this value to the sender
    Handled(isize),
    /// Forward the message along the chain
    Default(Chain),
}

/// Value returned for a creation message whose hook failed
const CREATE_ABORTED: isize = -1;

impl Shell {
    /// Deliver a native message to the controller bound to `handle`
    pub fn dispatch(&self, handle: WindowHandle, msg: &Message) -> Dispatch {
        let (controller, chain) = match self.registry.lookup_entry(handle) {
            Some(entry) => entry,
            None => match self.adopt_pending(handle) {
                Some(entry) => entry,
                None => return Dispatch::Default(Chain::DefaultProc),
            },
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_controller(handle, &controller, msg)
        }));

        let reply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!("Creation of {:?} aborted: {}", handle, e);
                self.release(handle);
                return Dispatch::Handled(CREATE_ABORTED);
            }
            Err(payload) => {
                error!(
                    "Controller for {:?} panicked on {:?}: {}",
                    handle,
                    msg,
                    panic_message(payload.as_ref())
                );
                Reply::Default
            }
        };

        if *msg == Message::Destroy {
            self.release(handle);
        }

        match reply {
            Reply::Handled(value) => Dispatch::Handled(value),
            Reply::Default => Dispatch::Default(chain),
        }
    }

    /// Bind the pending factory (if any) to a handle seen for the first time
    fn adopt_pending(&self, handle: WindowHandle) -> Option<(ControllerRef, Chain)> {
        let factory = {
            let slot = self.creator.lock();
            let taken = slot.borrow_mut().take();
            taken
        }?;

        let controller = factory(handle, self);
        if !self.registry.register(handle, controller.clone(), Chain::DefaultProc) {
            return None;
        }
        debug!("Adopted pending controller for {:?}", handle);
        Some((controller, Chain::DefaultProc))
    }

    /// Run the controller hooks for one message.
    ///
    /// Err means `on_create` failed and the creation must be aborted.
    fn run_controller(
        &self,
        handle: WindowHandle,
        controller: &ControllerRef,
        msg: &Message,
    ) -> ShellResult<Reply> {
        let Some(mut guard) = controller.try_lock() else {
            if *msg == Message::Destroy {
                warn!("{:?} destroyed while its controller is running", handle);
            } else {
                debug!("Re-entrant {:?} for busy {:?}, using default", msg, handle);
            }
            return Ok(Reply::Default);
        };

        if *msg == Message::Create {
            guard.on_create(self)?;
        }
        Ok(guard.window_proc(msg, self))
    }

    /// Remove the binding of a destroyed window; the controller is dropped
    /// once the registry lock is released.
    fn release(&self, handle: WindowHandle) {
        let Some(entry) = self.registry.unregister(handle) else {
            return;
        };
        if let Chain::Original(original) = entry.chain {
            self.platform.restore_proc(handle, original);
        }
        drop(entry);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
