//! Declaring a panel application: its fields, key contexts, and background tasks.
//!
//! Everything is registered on an [`AppBuilder`] before the session starts. Mistakes
//! such as a field declared twice are remembered and reported by [`AppBuilder::build`],
//! so a misconfigured application never reaches the panel.

use crate::config::{Layout, DEFAULT_BRIGHTNESS};
use crate::context::{handler, ContextDispatcher, Handler};
use crate::error::PanelError;
use crate::field::FieldRegistry;
use crate::queue::OutboundQueue;
use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Background unit started once the session is running.
pub type Task = Box<dyn FnOnce(PanelHandle) -> Result<()> + Send>;

/// Shareable access to the panel's fields, safe to use from any thread.
#[derive(Clone)]
pub struct PanelHandle {
    fields: Arc<FieldRegistry>,
    queue: Arc<OutboundQueue>,
}

impl PanelHandle {
    pub(crate) fn new(fields: Arc<FieldRegistry>, queue: Arc<OutboundQueue>) -> Self {
        Self { fields, queue }
    }

    /// Set a field's text, queueing whatever redraw is needed, and return the text
    /// the field now holds.
    ///
    /// Updates of one field are expected to come from one logical writer at a time.
    pub fn update(&self, name: &str, text: impl AsRef<str>) -> Result<String, PanelError> {
        self.fields.update(name, text.as_ref(), &self.queue)
    }

    pub fn text(&self, name: &str) -> Result<String, PanelError> {
        self.fields.text(name)
    }

    /// Commands queued but not yet written to the panel.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl fmt::Debug for PanelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelHandle")
            .field("fields", &self.fields.len())
            .field("pending", &self.queue.len())
            .finish()
    }
}

/// What a key handler or the setup hook can touch while it runs on the event loop.
pub struct HandlerContext<'a> {
    panel: &'a PanelHandle,
    contexts: &'a mut ContextDispatcher,
    key: Option<&'a str>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(
        panel: &'a PanelHandle,
        contexts: &'a mut ContextDispatcher,
        key: Option<&'a str>,
    ) -> Self {
        Self {
            panel,
            contexts,
            key,
        }
    }

    pub fn update(&self, name: &str, text: impl AsRef<str>) -> Result<String, PanelError> {
        self.panel.update(name, text)
    }

    pub fn text(&self, name: &str) -> Result<String, PanelError> {
        self.panel.text(name)
    }

    /// Make another context receive subsequent key presses.
    pub fn set_context(&mut self, name: &str) -> Result<(), PanelError> {
        self.contexts.set_active(name)
    }

    pub fn active_context(&self) -> Option<&str> {
        self.contexts.active()
    }

    /// Key that triggered this handler; `None` inside the setup hook.
    pub fn key(&self) -> Option<&str> {
        self.key
    }

    /// Owned handle for work that outlives the handler, e.g. a spawned thread.
    pub fn handle(&self) -> PanelHandle {
        self.panel.clone()
    }
}

/// A validated application, ready to be handed to a session.
pub struct PanelApp {
    pub(crate) brightness: u8,
    pub(crate) fields: FieldRegistry,
    pub(crate) contexts: ContextDispatcher,
    pub(crate) tasks: Vec<(String, Task)>,
    pub(crate) setup: Option<Handler>,
}

impl PanelApp {
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn contexts(&self) -> &ContextDispatcher {
        &self.contexts
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for PanelApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelApp")
            .field("brightness", &self.brightness)
            .field("fields", &self.fields)
            .field("contexts", &self.contexts)
            .field("tasks", &self.task_names().collect::<Vec<_>>())
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct AppBuilder {
    brightness: Option<u8>,
    fields: FieldRegistry,
    contexts: ContextDispatcher,
    current_context: Option<String>,
    tasks: Vec<(String, Task)>,
    task_names: HashSet<String>,
    setup: Option<Handler>,
    error: Option<PanelError>,
}

impl AppBuilder {
    pub fn brightness(mut self, level: u8) -> Self {
        self.brightness = Some(level);
        self
    }

    pub fn field(mut self, name: &str, x: usize, y: usize) -> Self {
        let result = self.fields.register(name, x, y);
        self.record(result);
        self
    }

    /// Register the fields, and brightness if present, described by a layout file.
    pub fn layout(mut self, layout: &Layout) -> Self {
        if let Some(level) = layout.brightness {
            self.brightness = Some(level);
        }
        for spec in &layout.fields {
            self = self.field(&spec.name, spec.x, spec.y);
        }
        self
    }

    /// Open a context; following [`AppBuilder::key`] calls bind into it.
    pub fn context(mut self, name: &str) -> Self {
        let result = self.contexts.add_context(name);
        self.record(result);
        self.current_context = Some(name.to_string());
        self
    }

    pub fn key<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let result = match self.current_context.as_deref() {
            Some(context) => self.contexts.bind(context, name, handler(f)),
            None => Err(PanelError::KeyOutsideContext(name.to_string())),
        };
        self.record(result);
        self
    }

    pub fn task<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnOnce(PanelHandle) -> Result<()> + Send + 'static,
    {
        if self.task_names.insert(name.to_string()) {
            self.tasks.push((name.to_string(), Box::new(f)));
        } else {
            self.record(Err(PanelError::DuplicateTask(name.to_string())));
        }
        self
    }

    /// Run once on the event loop after the panel is reset, before tasks start.
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.setup = Some(handler(f));
        self
    }

    pub fn build(self) -> Result<PanelApp, PanelError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(PanelApp {
            brightness: self.brightness.unwrap_or(DEFAULT_BRIGHTNESS),
            fields: self.fields,
            contexts: self.contexts,
            tasks: self.tasks,
            setup: self.setup,
        })
    }

    fn record(&mut self, result: Result<(), PanelError>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}
