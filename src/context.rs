//! Key bindings grouped into contexts, one of which is active at a time.

use crate::app::HandlerContext;
use crate::error::PanelError;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback bound to a key; runs on the event loop thread.
pub type Handler = Arc<dyn Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
pub struct ContextDispatcher {
    contexts: HashMap<String, HashMap<String, Handler>>,
    active: Option<String>,
}

impl ContextDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty context. The newest context becomes the active one.
    pub fn add_context(&mut self, name: &str) -> Result<(), PanelError> {
        if self.contexts.contains_key(name) {
            return Err(PanelError::DuplicateContext(name.to_string()));
        }
        self.contexts.insert(name.to_string(), HashMap::new());
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn bind(&mut self, context: &str, key: &str, handler: Handler) -> Result<(), PanelError> {
        let bindings = self
            .contexts
            .get_mut(context)
            .ok_or_else(|| PanelError::UnknownContext(context.to_string()))?;
        if bindings.contains_key(key) {
            return Err(PanelError::DuplicateKey {
                context: context.to_string(),
                key: key.to_string(),
            });
        }
        bindings.insert(key.to_string(), handler);
        Ok(())
    }

    /// Handler bound to `key` in `context`, if any.
    pub fn dispatch(&self, context: &str, key: &str) -> Option<Handler> {
        self.contexts.get(context)?.get(key).cloned()
    }

    /// Handler bound to `key` in the active context, if any.
    pub fn dispatch_active(&self, key: &str) -> Option<Handler> {
        self.dispatch(self.active.as_deref()?, key)
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), PanelError> {
        if !self.contexts.contains_key(name) {
            return Err(PanelError::UnknownContext(name.to_string()));
        }
        if self.active.as_deref() != Some(name) {
            tracing::debug!(from = ?self.active, to = name, "context switch");
            self.active = Some(name.to_string());
        }
        Ok(())
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

impl fmt::Debug for ContextDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut contexts: Vec<(&String, Vec<&String>)> = self
            .contexts
            .iter()
            .map(|(name, bindings)| (name, bindings.keys().collect()))
            .collect();
        contexts.sort();
        f.debug_struct("ContextDispatcher")
            .field("contexts", &contexts)
            .field("active", &self.active)
            .finish()
    }
}
