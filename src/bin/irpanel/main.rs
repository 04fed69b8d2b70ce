//! irpanel entrypoint: connect to the panel daemon and run the bundled application.
//!
//! # Architecture
//!
//! - Reader thread: splits the socket into lines for the event loop
//! - Event loop: dispatches key presses and writes queued commands one at a time
//! - Task threads: background producers such as the clock

mod demo;

use anyhow::Result;
use irpanel::config::{AppConfig, Layout};
use irpanel::signals::{install_termination_handlers, termination_requested};
use irpanel::transport::connect;
use irpanel::{init_logging, KeyMap, Session};

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config.logging)?;
    let target = config.panel_target()?;
    let keymap = KeyMap::load(&config.keys)?;

    let layout = match &config.layout {
        Some(path) => Layout::load(path)?,
        None => demo::default_layout()?,
    };
    demo::check_layout(&layout)?;
    let mut builder = demo::build(&layout);
    if let Some(level) = config.brightness {
        builder = builder.brightness(level);
    }
    let app = builder.build()?;

    let connection = connect(&target)?;
    tracing::info!(peer = %connection.peer, "connected to panel");
    install_termination_handlers(connection.raw_fd)?;

    let result = Session::start(app, keymap, connection.reader, connection.writer)
        .and_then(Session::run);
    match result {
        Err(err) if termination_requested() => {
            tracing::info!("terminated ({err})");
            Ok(())
        }
        Err(err) => {
            tracing::error!("session failed: {err:#}");
            Err(err)
        }
        Ok(()) => Ok(()),
    }
}
