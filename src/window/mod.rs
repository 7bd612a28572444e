//! Window controller framework
//!
//! Binds controllers to native window handles and routes messages to them.

pub mod controller;
pub mod manager;
pub mod message;
pub mod proc;
pub mod registry;

pub use controller::{route_default, Controller, Reply};
pub use message::Message;
pub use proc::Dispatch;
pub use registry::Chain;
