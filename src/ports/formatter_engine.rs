//! The shared contract every isolated engine is invoked through.

use thiserror::Error;

use crate::domain::Preferences;

/// Diagnostic raised by an engine while formatting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// A formatter engine instance living behind an isolation boundary.
pub trait FormatterEngine: Send + Sync {
    fn format(&self, input: &str) -> Result<String, EngineError>;
}

/// Host-side constructor a module class entry links against.
pub type EngineConstructor = fn(&Preferences) -> Result<Box<dyn FormatterEngine>, EngineError>;
