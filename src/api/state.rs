use std::sync::Arc;

use crate::config::ValidationError;
use crate::instance::{Instance, Registry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    /// Fails if two instances are mounted at the same path prefix.
    ///
    /// Prefixes changed through [`Instance::configure`] after this point are
    /// not re-checked.
    pub fn new(registry: Registry) -> Result<Self, ValidationError> {
        registry.check_prefixes()?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Instances in the order a request tries them: longest path prefix
    /// first, unprefixed instances last, ties broken by name.
    ///
    /// Computed per call since prefixes can be reconfigured at runtime.
    pub fn mount_order(&self) -> Vec<Arc<Instance>> {
        let mut instances: Vec<(Option<usize>, Arc<Instance>)> = self
            .registry
            .instances()
            .into_iter()
            .map(|instance| {
                let prefix_len = instance.settings().path_prefix.map(|p| p.len());
                (prefix_len, instance)
            })
            .collect();

        // Registry order is by name already, and the sort is stable
        instances.sort_by(|(a, _), (b, _)| b.cmp(a));
        instances.into_iter().map(|(_, instance)| instance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_order() {
        let registry = Registry::new();
        registry
            .instance("short")
            .configure(|c| c.path_prefix = Some("/m".into()))
            .unwrap();
        registry
            .instance("long")
            .configure(|c| c.path_prefix = Some("/media/thumbs".into()))
            .unwrap();
        registry
            .instance("zeta")
            .configure(|c| c.path_prefix = Some("/z".into()))
            .unwrap();
        registry.instance("alpha");

        let state = AppState::new(registry).unwrap();
        let names: Vec<String> = state
            .mount_order()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        assert_eq!(names, vec!["long", "short", "zeta", "alpha"]);
    }

    #[test]
    fn test_shared_prefix_rejected() {
        let registry = Registry::new();
        registry.instance("docs");
        registry.instance("files");

        assert!(matches!(
            AppState::new(registry),
            Err(ValidationError::DuplicatePathPrefix { .. })
        ));
    }
}
