//! Configuration management for contentbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use contentbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! let registry = config.build_registry().expect("Failed to build instances");
//! println!("Serving {} instance(s) on {}", registry.len(), config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `CONTENTBOX__<section>__<key>`, for example
//! `CONTENTBOX__SERVER__BIND_ADDR=0.0.0.0:9000` or
//! `CONTENTBOX__INSTANCES__DEFAULT__PROTECT_FROM_DOS_ATTACKS=false`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/contentbox.toml`.
//! This can be overridden using the `CONTENTBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, DEFAULT_INSTANCE, InstanceConfig, ServerConfig, StorageConfig, StorageProvider,
};
pub use sources::config_path;
pub use validation::{ValidationError, validate_settings};

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::instance::Registry;
use crate::storage::{Datastore, ObjectStoreDatastore, StorageError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to open storage: {0}")]
    Storage(#[from] StorageError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`CONTENTBOX__*`)
    /// 2. TOML file (default: `config/contentbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Create and configure one instance per `[instances.<name>]` section.
    ///
    /// With no section at all a single `default` instance is created.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let registry = Registry::new();

        let default_only: HashMap<String, InstanceConfig>;
        let instances = if self.instances.is_empty() {
            default_only = HashMap::from([(DEFAULT_INSTANCE.to_string(), InstanceConfig::default())]);
            &default_only
        } else {
            &self.instances
        };

        for (name, instance_config) in instances {
            let instance = registry.instance(name);
            let settings = instance_config.settings();
            instance.configure(|current| *current = settings)?;

            for (key, mime_type) in &instance_config.mime_types {
                instance.register_mime_type(key, mime_type.clone());
            }

            instance.set_datastore(self.datastore_for(name)?);
        }

        tracing::info!(instances = ?registry.names(), "Instances configured");
        Ok(registry)
    }

    fn datastore_for(&self, instance: &str) -> Result<Arc<dyn Datastore>, ConfigError> {
        let datastore = match (self.storage.provider, &self.storage.root) {
            (StorageProvider::Local, Some(root)) => ObjectStoreDatastore::local(root, instance)?,
            (StorageProvider::Local, None) => return Err(ValidationError::MissingStorageRoot.into()),
            (StorageProvider::Memory, _) => ObjectStoreDatastore::in_memory(instance),
        };
        Ok(Arc::new(datastore))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[instances.images]
path_prefix = "/media"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.instances.len(), 1);
        assert!(config.instances.contains_key("images"));
    }

    #[test]
    fn test_validation_catches_bad_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[instances.images]
path_prefix = "media/"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::Instance { .. })
        ));
    }

    #[test]
    fn test_build_registry_applies_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[instances.images]
path_prefix = "/media"
protect_from_dos_attacks = false
cache_duration_secs = 60

[instances.images.mime_types]
mark = "application/mark"

[instances.docs]
path_prefix = "/docs"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.names(), vec!["docs".to_string(), "images".to_string()]);

        let images = registry.get("images").unwrap();
        let settings = images.settings();
        assert_eq!(settings.path_prefix.as_deref(), Some("/media"));
        assert!(!settings.protect_from_dos_attacks);
        assert_eq!(settings.cache_duration_secs, 60);
        assert_eq!(images.mime_type_for("mark").as_deref(), Some("application/mark"));

        let docs = registry.get("docs").unwrap();
        assert!(docs.mime_type_for("mark").is_none());
        assert!(docs.settings().protect_from_dos_attacks);
    }

    #[test]
    fn test_empty_instances_fall_back_to_default() {
        let config = Config {
            instances: HashMap::new(),
            ..Config::default()
        };
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.names(), vec![DEFAULT_INSTANCE.to_string()]);
    }

    #[tokio::test]
    async fn test_local_storage_is_per_instance() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.provider = StorageProvider::Local;
        config.storage.root = Some(temp_dir.path().to_path_buf());

        let registry = config.build_registry().unwrap();
        let instance = registry.get(DEFAULT_INSTANCE).unwrap();
        let uid = instance.store("HELLO THERE").await.unwrap();

        assert!(temp_dir.path().join(DEFAULT_INSTANCE).join(&uid).exists());
    }
}
