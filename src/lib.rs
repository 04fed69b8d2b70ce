//! Drive an IR remote-control panel over its line protocol.
//!
//! An application declares named text fields and key bindings grouped into contexts
//! with [`PanelApp::builder`], then hands the result to a [`Session`] on a connected
//! socket. Field updates are diffed against what the panel already shows and only the
//! changed span is sent.

pub mod app;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod field;
pub mod keymap;
mod lock;
pub mod logging;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod signals;
pub mod transport;

pub(crate) use lock::lock_or_recover;

pub use app::{AppBuilder, HandlerContext, PanelApp, PanelHandle};
pub use error::PanelError;
pub use keymap::KeyMap;
pub use logging::init_logging;
pub use session::Session;
