//! Controller trait bound to one native window
//!
//! A controller receives every message of its window through
//! [`Controller::window_proc`]. The default implementation hands off to
//! [`route_default`], which splits commands and notifications into their own
//! hooks. Controllers that override `window_proc` call `route_default` for
//! the messages they do not take, the same way a derived window procedure
//! falls back to its base.

use std::any::Any;

use crate::error::ShellResult;
use crate::shell::Shell;

use super::message::Message;

/// Result of a controller hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Message fully handled, return this value to the sender
    Handled(isize),
    /// Continue with the default action (default procedure or the
    /// procedure that was in place before subclassing)
    Default,
}

/// Behavior attached to a native window handle
pub trait Controller: Send + 'static {
    /// Called for the creation message before any other processing.
    /// An error aborts the window creation.
    fn on_create(&mut self, _shell: &Shell) -> ShellResult<()> {
        Ok(())
    }

    /// Generic message hook; sees every message including `Destroy`
    fn window_proc(&mut self, msg: &Message, shell: &Shell) -> Reply {
        route_default(self, msg, shell)
    }

    /// `WM_COMMAND` hook
    fn command(&mut self, _id: u32, _code: u32, _shell: &Shell) -> Reply {
        Reply::Default
    }

    /// `WM_NOTIFY` hook; `header` addresses the native notification block
    fn notify(&mut self, _id: u32, _code: i32, _header: isize, _shell: &Shell) -> Reply {
        Reply::Default
    }

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Cast to Any mutably for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Base routing shared by all controllers
pub fn route_default<C: Controller + ?Sized>(controller: &mut C, msg: &Message, shell: &Shell) -> Reply {
    match msg {
        Message::Command { id, code } => controller.command(*id, *code, shell),
        Message::Notify { id, code, header } => controller.notify(*id, *code, *header, shell),
        _ => Reply::Default,
    }
}
