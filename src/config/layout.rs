use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Field placement loaded from a YAML file, so the screen can be rearranged
/// without rebuilding the application.
///
/// ```yaml
/// brightness: 60
/// fields:
///   - { name: clock, x: 12, y: 0 }
///   - { name: volume, x: 0, y: 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    #[serde(default)]
    pub brightness: Option<u8>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub x: usize,
    pub y: usize,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid layout")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading layout {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing layout {}", path.display()))
    }

    /// Whether a field with this name is placed by the layout.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }
}
