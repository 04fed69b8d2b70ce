//! Infrared code to key name table.
//!
//! The table is a CSV file of `name,address,command` rows, as produced by
//! `irpanel-readkeys`. It is read once at startup and never changes afterwards.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMapError {
    MalformedRow { line: usize, row: String },
}

impl fmt::Display for KeyMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMapError::MalformedRow { line, row } => {
                write!(f, "line {line}: expected name,address,command, got {row:?}")
            }
        }
    }
}

impl std::error::Error for KeyMapError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    keys: HashMap<String, String>,
}

impl KeyMap {
    /// Read and parse a key table file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading key table {}", path.display()))?;
        let keymap =
            Self::parse(&text).with_context(|| format!("parsing key table {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            codes = keymap.len(),
            "key table loaded"
        );
        Ok(keymap)
    }

    /// Parse key table text. A single bad row rejects the whole table.
    pub fn parse(text: &str) -> Result<Self, KeyMapError> {
        let mut keys = HashMap::new();
        for (idx, row) in text.lines().enumerate() {
            if row.trim().is_empty() {
                continue;
            }
            let (name, code) = parse_row(row).ok_or_else(|| KeyMapError::MalformedRow {
                line: idx + 1,
                row: row.to_string(),
            })?;
            keys.insert(code, name);
        }
        Ok(Self { keys })
    }

    /// Key name bound to an `address:command` code.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.keys.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(String, String)> for KeyMap {
    /// Build from `(code, name)` pairs.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Render one key table row the way [`KeyMap::parse`] reads it back.
pub fn format_row(name: &str, address: u32, command: u32) -> String {
    format!("\"{name}\",{address},{command}")
}

fn parse_row(row: &str) -> Option<(String, String)> {
    let cells: Vec<&str> = row.split(',').map(str::trim).collect();
    let [name, address, command] = cells.as_slice() else {
        return None;
    };
    let name = name.replace('"', "");
    if name.is_empty() || address.is_empty() || command.is_empty() {
        return None;
    }
    Some((name, format!("{address}:{command}")))
}
