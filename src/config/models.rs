use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::instance::{DEFAULT_CACHE_DURATION_SECS, Settings};
use crate::serializer::{
    DEFAULT_MAX_ARG_DEPTH, DEFAULT_MAX_STEPS, DEFAULT_MAX_TOKEN_BYTES, DecodeLimits,
};

/// Name of the instance created when none is configured
pub const DEFAULT_INSTANCE: &str = "default";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_instances")]
    pub instances: HashMap<String, InstanceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            instances: default_instances(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Where stored payloads live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    Memory,
    Local,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    /// Directory for the `local` provider; each instance gets a subdirectory
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Per-instance settings as written in `[instances.<name>]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    #[serde(default)]
    pub path_prefix: Option<String>,
    #[serde(default = "default_true")]
    pub protect_from_dos_attacks: bool,
    #[serde(default = "default_max_token_bytes")]
    pub max_token_bytes: usize,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_arg_depth")]
    pub max_arg_depth: usize,
    #[serde(default = "default_cache_duration_secs")]
    pub cache_duration_secs: u64,
    /// Extra or overriding extension to content type entries
    #[serde(default)]
    pub mime_types: BTreeMap<String, String>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            path_prefix: None,
            protect_from_dos_attacks: true,
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
            max_steps: DEFAULT_MAX_STEPS,
            max_arg_depth: DEFAULT_MAX_ARG_DEPTH,
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
            mime_types: BTreeMap::new(),
        }
    }
}

impl InstanceConfig {
    pub fn settings(&self) -> Settings {
        Settings {
            path_prefix: self.path_prefix.clone(),
            protect_from_dos_attacks: self.protect_from_dos_attacks,
            limits: DecodeLimits {
                max_token_bytes: self.max_token_bytes,
                max_steps: self.max_steps,
                max_arg_depth: self.max_arg_depth,
            },
            cache_duration_secs: self.cache_duration_secs,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_instances() -> HashMap<String, InstanceConfig> {
    HashMap::from([(DEFAULT_INSTANCE.to_string(), InstanceConfig::default())])
}

fn default_true() -> bool {
    true
}

fn default_max_token_bytes() -> usize {
    DEFAULT_MAX_TOKEN_BYTES
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_max_arg_depth() -> usize {
    DEFAULT_MAX_ARG_DEPTH
}

fn default_cache_duration_secs() -> u64 {
    DEFAULT_CACHE_DURATION_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_default_instance() {
        let config = Config::default();
        assert_eq!(config.instances.len(), 1);
        assert!(config.instances.contains_key(DEFAULT_INSTANCE));
        assert_eq!(config.storage.provider, StorageProvider::Memory);
    }

    #[test]
    fn test_instance_config_from_toml() {
        let parsed: InstanceConfig = toml::from_str(
            r#"
path_prefix = "/media"
protect_from_dos_attacks = false
max_steps = 4

[mime_types]
mark = "application/mark"
            "#,
        )
        .unwrap();

        let settings = parsed.settings();
        assert_eq!(settings.path_prefix.as_deref(), Some("/media"));
        assert!(!settings.protect_from_dos_attacks);
        assert_eq!(settings.limits.max_steps, 4);
        assert_eq!(settings.limits.max_token_bytes, DEFAULT_MAX_TOKEN_BYTES);
        assert_eq!(settings.cache_duration_secs, DEFAULT_CACHE_DURATION_SECS);
        assert_eq!(parsed.mime_types["mark"], "application/mark");
    }

    #[test]
    fn test_default_settings_match_instance_defaults() {
        assert_eq!(InstanceConfig::default().settings(), Settings::default());
    }
}
