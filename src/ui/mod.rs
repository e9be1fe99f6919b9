//! Model-view-update front of the application.
//!
//! Every unit follows the same shape: a state struct, a `Message` enum, an `update`
//! that mutates state and hands back deferred work as a [`Task`], and a `view` that
//! renders the state into an [`Element`] tree after every update.

pub mod components;
pub mod element;
pub mod messages;
pub mod navigator;
pub mod runtime;
pub mod shell;
pub mod task;

pub use element::Element;
pub use messages::RootMessage;
pub use runtime::{Application, Runtime};
pub use shell::AppShell;
pub use task::Task;
