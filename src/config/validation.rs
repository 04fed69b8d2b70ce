use super::{AppConfig, LoggingConfig};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fmt;
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before anything touches the panel.
    pub fn validate(&mut self) -> Result<()> {
        self.panel_target()?;

        if !self.keys.is_file() {
            bail!("--keys file '{}' does not exist", self.keys.display());
        }
        if let Some(layout) = &self.layout {
            if !layout.is_file() {
                bail!("--layout file '{}' does not exist", layout.display());
            }
        }
        self.logging.validate()
    }

    pub fn panel_target(&self) -> Result<PanelTarget> {
        PanelTarget::parse(&self.target)
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.log_file {
            if path.is_dir() {
                bail!("--log-file '{}' is a directory", path.display());
            }
        }
        Ok(())
    }
}

/// Where the panel daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelTarget {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl PanelTarget {
    /// An existing filesystem path is a Unix socket; anything else must be `HOST:PORT`.
    pub fn parse(target: &str) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            bail!("panel target must not be empty");
        }
        let path = Path::new(target);
        if path.exists() {
            return Ok(PanelTarget::Unix(path.to_path_buf()));
        }
        let Some((host, port)) = target.rsplit_once(':') else {
            bail!("panel target '{target}' is neither an existing socket path nor HOST:PORT");
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            bail!("panel target '{target}' is missing a host");
        }
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port in panel target '{target}'"))?;
        if port == 0 {
            bail!("port in panel target '{target}' must be between 1 and 65535");
        }
        Ok(PanelTarget::Tcp {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for PanelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelTarget::Unix(path) => write!(f, "{}", path.display()),
            PanelTarget::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}
