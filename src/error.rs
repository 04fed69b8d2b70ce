use std::fmt;

/// Configuration and programming errors raised by panel registration and handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    DuplicateField(String),
    DuplicateContext(String),
    DuplicateKey { context: String, key: String },
    DuplicateTask(String),
    KeyOutsideContext(String),
    UnknownField(String),
    UnknownContext(String),
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::DuplicateField(name) => write!(f, "field {name} already defined"),
            PanelError::DuplicateContext(name) => write!(f, "context {name} already defined"),
            PanelError::DuplicateKey { context, key } => {
                write!(f, "key {key} already defined in {context}")
            }
            PanelError::DuplicateTask(name) => write!(f, "task {name} already defined"),
            PanelError::KeyOutsideContext(key) => {
                write!(f, "key {key} defined outside of any context")
            }
            PanelError::UnknownField(name) => write!(f, "no such field {name}"),
            PanelError::UnknownContext(name) => write!(f, "no such context {name}"),
        }
    }
}

impl std::error::Error for PanelError {}
