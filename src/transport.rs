//! Connecting to the panel daemon over a Unix or TCP socket.

use crate::config::PanelTarget;
use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

/// A connected panel socket, split into independently owned halves.
pub struct Connection {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
    /// Descriptor shared by both halves, for the termination signal handler.
    pub raw_fd: RawFd,
    pub peer: String,
}

pub fn connect(target: &PanelTarget) -> Result<Connection> {
    match target {
        PanelTarget::Unix(path) => {
            let stream = UnixStream::connect(path)
                .with_context(|| format!("can't open Unix socket {}", path.display()))?;
            let reader = stream.try_clone().context("cloning Unix socket")?;
            Ok(Connection {
                raw_fd: stream.as_raw_fd(),
                reader: Box::new(reader),
                writer: Box::new(stream),
                peer: target.to_string(),
            })
        }
        PanelTarget::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port))
                .with_context(|| format!("can't connect to {host}:{port}"))?;
            // Commands are tiny and each waits for a reply.
            stream.set_nodelay(true).context("setting TCP_NODELAY")?;
            let reader = stream.try_clone().context("cloning TCP socket")?;
            Ok(Connection {
                raw_fd: stream.as_raw_fd(),
                reader: Box::new(reader),
                writer: Box::new(stream),
                peer: target.to_string(),
            })
        }
    }
}
