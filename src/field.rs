//! Named text regions on the panel and the update path that keeps them in sync.

use crate::diff::{clean_text, diff, Update};
use crate::error::PanelError;
use crate::lock_or_recover;
use crate::protocol::PanelCommand;
use crate::queue::OutboundQueue;
use std::collections::HashMap;
use std::sync::Mutex;

/// A text region anchored at a fixed panel position.
///
/// `data` is what the panel is known to show once queued commands are flushed, and
/// is the baseline for the next diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    x: usize,
    y: usize,
    data: String,
}

impl Field {
    pub fn new(name: impl Into<String>, x: usize, y: usize) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            data: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Replace the field text, returning the commands that redraw what changed.
    pub fn set(&mut self, text: &str) -> Option<[PanelCommand; 2]> {
        let update = diff(&self.data, text);
        self.data = text.to_string();
        match update {
            Update::None => None,
            Update::Targeted { offset, text } => Some([
                PanelCommand::Goto {
                    x: self.x + offset,
                    y: self.y,
                },
                PanelCommand::Print(text),
            ]),
            Update::FullRewrite(text) => Some([
                PanelCommand::Goto {
                    x: self.x,
                    y: self.y,
                },
                PanelCommand::Print(text),
            ]),
        }
    }
}

/// All fields of a panel application, fixed once the session starts.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, Mutex<Field>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, x: usize, y: usize) -> Result<(), PanelError> {
        if self.fields.contains_key(name) {
            return Err(PanelError::DuplicateField(name.to_string()));
        }
        self.fields
            .insert(name.to_string(), Mutex::new(Field::new(name, x, y)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Current text of a field.
    pub fn text(&self, name: &str) -> Result<String, PanelError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| PanelError::UnknownField(name.to_string()))?;
        Ok(lock_or_recover(field, "field").data.clone())
    }

    /// Set a field's text and queue the redraw, returning the stored text.
    ///
    /// Input is normalized to what the panel can display. The field stays locked
    /// until its commands are queued, so concurrent updates of one field reach the
    /// panel in the same order their diffs were taken.
    pub fn update(
        &self,
        name: &str,
        text: &str,
        queue: &OutboundQueue,
    ) -> Result<String, PanelError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| PanelError::UnknownField(name.to_string()))?;
        let text = clean_text(text);
        let mut field = lock_or_recover(field, "field");
        match field.set(&text) {
            Some(commands) => {
                tracing::trace!(field = name, "queueing {} commands", commands.len());
                queue.push_all(commands);
            }
            None => tracing::trace!(field = name, "unchanged"),
        }
        Ok(field.data.clone())
    }
}
