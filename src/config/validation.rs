use super::models::{Config, StorageProvider};
use crate::instance::Settings;
use crate::serializer::MAX_ARG_DEPTH_LIMIT;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Path prefix '{prefix}' must start with '/', not end with '/' and contain no empty segments")]
    InvalidPathPrefix { prefix: String },

    #[error("Decode limit {field} must be positive")]
    ZeroLimit { field: &'static str },

    #[error("Decode limit {field} is {value}, at most {max} is supported")]
    LimitTooHigh {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("Instance '{instance}' maps '{key}' to invalid content type '{value}'")]
    InvalidMimeType {
        instance: String,
        key: String,
        value: String,
    },

    #[error("Instances '{first}' and '{second}' share path prefix '{prefix}'")]
    DuplicatePathPrefix {
        first: String,
        second: String,
        prefix: String,
    },

    #[error("Storage provider is local but no root directory is set")]
    MissingStorageRoot,

    #[error("Instance '{instance}': {source}")]
    Instance {
        instance: String,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_storage(config)?;
    validate_instances(config)?;
    Ok(())
}

/// Checks that hold for every instance, configured from a file or in code
pub fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    if let Some(prefix) = &settings.path_prefix {
        let valid = prefix.starts_with('/')
            && !prefix.ends_with('/')
            && !prefix.contains("//");
        if !valid {
            return Err(ValidationError::InvalidPathPrefix {
                prefix: prefix.clone(),
            });
        }
    }

    let limits = &settings.limits;
    for (field, value) in [
        ("max_token_bytes", limits.max_token_bytes),
        ("max_steps", limits.max_steps),
        ("max_arg_depth", limits.max_arg_depth),
    ] {
        if value == 0 {
            return Err(ValidationError::ZeroLimit { field });
        }
    }

    if limits.max_arg_depth > MAX_ARG_DEPTH_LIMIT {
        return Err(ValidationError::LimitTooHigh {
            field: "max_arg_depth",
            value: limits.max_arg_depth,
            max: MAX_ARG_DEPTH_LIMIT,
        });
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.provider == StorageProvider::Local && config.storage.root.is_none() {
        return Err(ValidationError::MissingStorageRoot);
    }
    Ok(())
}

fn validate_instances(config: &Config) -> Result<(), ValidationError> {
    let mut names: Vec<&String> = config.instances.keys().collect();
    names.sort();

    let mut seen_prefixes: Vec<(&str, &str)> = Vec::new();
    for name in names {
        let instance = &config.instances[name];

        validate_settings(&instance.settings()).map_err(|source| ValidationError::Instance {
            instance: name.clone(),
            source: Box::new(source),
        })?;

        for (key, value) in &instance.mime_types {
            if value.parse::<mime::Mime>().is_err() {
                return Err(ValidationError::InvalidMimeType {
                    instance: name.clone(),
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }

        let prefix = instance.path_prefix.as_deref().unwrap_or("");
        if let Some((first, _)) = seen_prefixes.iter().find(|(_, p)| *p == prefix) {
            return Err(ValidationError::DuplicatePathPrefix {
                first: first.to_string(),
                second: name.clone(),
                prefix: prefix.to_string(),
            });
        }
        seen_prefixes.push((name.as_str(), prefix));
    }

    Ok(())
}
