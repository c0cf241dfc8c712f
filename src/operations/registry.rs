use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::builtin::{FormatProcessor, TextGenerator};
use super::traits::{Generator, Processor};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

/// Named generators and processors available to one instance
#[derive(Clone, Default)]
pub struct OperationRegistry {
    generators: BTreeMap<String, Arc<dyn Generator>>,
    processors: BTreeMap<String, Arc<dyn Processor>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_generator(&mut self, name: impl Into<String>, generator: Arc<dyn Generator>) {
        self.generators.insert(name.into(), generator);
    }

    pub fn register_processor(&mut self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(name.into(), processor);
    }

    pub fn generator(&self, name: &str) -> Result<Arc<dyn Generator>, RegistryError> {
        self.generators
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))
    }

    pub fn processor(&self, name: &str) -> Result<Arc<dyn Processor>, RegistryError> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))
    }

    pub fn has_generator(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    pub fn has_processor(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Registry with the built-in byte-level operations
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_generator("text", Arc::new(TextGenerator));
        registry.register_processor("format", Arc::new(FormatProcessor));
        registry
    }
}
