//! Line protocol spoken with the panel daemon.
//!
//! Outbound commands are single newline-terminated lines; every one of them is
//! answered by exactly one line. Inbound lines start with a two-character tag.

use std::fmt;

/// Tag carried by infrared event packets.
pub const IR_TAG: &str = "ir";
/// Maximum length of the `address:command` code following the tag.
pub const IR_CODE_LEN: usize = 7;
const IR_CODE_OFFSET: usize = 3;

/// Command understood by the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    /// Clear the display and home the cursor.
    Clear,
    /// Set backlight brightness.
    Brightness(u8),
    /// Move the cursor to column `x`, row `y`.
    Goto { x: usize, y: usize },
    /// Print text at the cursor.
    Print(String),
}

impl PanelCommand {
    /// Wire form, including the trailing newline.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for PanelCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelCommand::Clear => write!(f, "c"),
            PanelCommand::Brightness(level) => write!(f, "d:{level}"),
            PanelCommand::Goto { x, y } => write!(f, "g:{x}:{y}"),
            PanelCommand::Print(text) => write!(f, "p:{text}"),
        }
    }
}

/// Concatenated wire form of a batch of commands.
pub fn encode_all(commands: &[PanelCommand]) -> String {
    commands.iter().map(PanelCommand::encode).collect()
}

/// Inbound packet from the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Infrared remote event; `code` is `address:command`.
    Infrared { code: String },
    /// Anything else the daemon may send.
    Other { tag: String, payload: String },
}

/// Inbound line that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketError {
    pub line: String,
    pub reason: &'static str,
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed packet {:?}: {}", self.line, self.reason)
    }
}

impl std::error::Error for PacketError {}

impl Packet {
    /// Parse one inbound line with its line terminator already removed.
    pub fn parse(line: &str) -> Result<Self, PacketError> {
        let malformed = |reason| PacketError {
            line: line.to_string(),
            reason,
        };
        let Some(tag) = line.get(..2) else {
            return Err(malformed("shorter than a tag"));
        };
        if tag != IR_TAG {
            return Ok(Packet::Other {
                tag: tag.to_string(),
                payload: line[2..].trim_start_matches(':').to_string(),
            });
        }
        if line.as_bytes().get(2) != Some(&b':') {
            return Err(malformed("missing separator after tag"));
        }
        let rest = &line[IR_CODE_OFFSET..];
        if rest.is_empty() {
            return Err(malformed("missing infrared code"));
        }
        let end = rest.len().min(IR_CODE_LEN);
        let code = rest
            .get(..end)
            .ok_or_else(|| malformed("infrared code is not ASCII"))?;
        Ok(Packet::Infrared {
            code: code.to_string(),
        })
    }
}

/// Split an infrared code into its numeric address and command.
pub fn split_code(code: &str) -> Option<(u32, u32)> {
    let (address, command) = code.split_once(':')?;
    Some((address.trim().parse().ok()?, command.trim().parse().ok()?))
}
