use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::Instance;
use crate::config::ValidationError;

/// Owner of all named instances.
///
/// Asking for the same name always yields the same `Arc<Instance>`;
/// instances are created on first use and live as long as the registry.
#[derive(Default)]
pub struct Registry {
    instances: RwLock<BTreeMap<String, Arc<Instance>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance called `name`, creating it if needed
    pub fn instance(&self, name: &str) -> Arc<Instance> {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        instances
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(instance = name, "Creating instance");
                Arc::new(Instance::new(name))
            })
            .clone()
    }

    /// Instance called `name`, if it was ever created
    pub fn get(&self, name: &str) -> Option<Arc<Instance>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// All instances, ordered by name
    pub fn instances(&self) -> Vec<Arc<Instance>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Fails if two instances share a path prefix; the one later in mount
    /// order could never be reached
    pub fn check_prefixes(&self) -> Result<(), ValidationError> {
        let mut seen: BTreeMap<Option<String>, String> = BTreeMap::new();
        for instance in self.instances() {
            let prefix = instance.settings().path_prefix;
            if let Some(first) = seen.get(&prefix) {
                return Err(ValidationError::DuplicatePathPrefix {
                    first: first.clone(),
                    second: instance.name().to_string(),
                    prefix: prefix.unwrap_or_default(),
                });
            }
            seen.insert(prefix, instance.name().to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
