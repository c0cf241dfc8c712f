//! Named instances and the registry that owns them
//!
//! An [`Instance`] bundles everything a job needs to run: its settings, mime
//! table, operations and datastore. All of it is instance-local; two
//! instances never share configuration.
//!
//! ```rust,ignore
//! let registry = Registry::new();
//! let images = registry.instance("images");
//! images.configure(|c| c.path_prefix = Some("/media".into()))?;
//!
//! let uid = images.store("HELLO THERE").await?;
//! let url = images.fetch(&uid).process("thumb", vec!["20x20".into()]).url();
//! ```

mod registry;

pub use registry::Registry;

use bytes::Bytes;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{ValidationError, validate_settings};
use crate::content::Content;
use crate::job::{Arg, Job};
use crate::mime::MimeTable;
use crate::observability::Metrics;
use crate::operations::{Generator, OperationRegistry, Processed, Processor, RegistryError};
use crate::serializer::{DecodeError, DecodeLimits};
use crate::storage::{self, Datastore, ObjectStoreDatastore};

/// One year, as long as shared caches will reasonably keep a response
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Runtime settings of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Mount point such as `/media`; `None` serves from the root
    pub path_prefix: Option<String>,
    /// Answer 400 instead of 404 for tokens over the decode limits
    pub protect_from_dos_attacks: bool,
    pub limits: DecodeLimits,
    pub cache_duration_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path_prefix: None,
            protect_from_dos_attacks: true,
            limits: DecodeLimits::default(),
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
        }
    }
}

pub struct Instance {
    name: String,
    settings: RwLock<Settings>,
    mime_types: RwLock<MimeTable>,
    operations: RwLock<OperationRegistry>,
    datastore: RwLock<Arc<dyn Datastore>>,
    metrics: Metrics,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Instance {
    /// Fresh instance with default settings, the built-in mime table and
    /// operations, and private in-memory storage
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let datastore: Arc<dyn Datastore> = Arc::new(ObjectStoreDatastore::in_memory(name.clone()));
        Self {
            settings: RwLock::new(Settings::default()),
            mime_types: RwLock::new(MimeTable::default()),
            operations: RwLock::new(OperationRegistry::with_defaults()),
            datastore: RwLock::new(datastore),
            metrics: Metrics::new(),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> Settings {
        read(&self.settings).clone()
    }

    /// Edit settings in place; the edit is discarded if it does not validate
    pub fn configure<F>(&self, edit: F) -> Result<(), ValidationError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings();
        edit(&mut settings);
        validate_settings(&settings)?;

        tracing::info!(
            instance = %self.name,
            path_prefix = ?settings.path_prefix,
            protect_from_dos_attacks = settings.protect_from_dos_attacks,
            "Instance configured"
        );
        *write(&self.settings) = settings;
        Ok(())
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn register_mime_type(&self, key: impl AsRef<str>, mime_type: impl Into<String>) {
        write(&self.mime_types).register(key, mime_type);
    }

    pub fn mime_type_for(&self, key: impl AsRef<str>) -> Option<String> {
        read(&self.mime_types).resolve(key).map(str::to_string)
    }

    pub fn mime_type_for_name(&self, name: &str) -> Option<String> {
        read(&self.mime_types).resolve_name(name).map(str::to_string)
    }

    pub fn register_generator(&self, name: impl Into<String>, generator: Arc<dyn Generator>) {
        write(&self.operations).register_generator(name, generator);
    }

    pub fn register_processor(&self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        write(&self.operations).register_processor(name, processor);
    }

    pub fn generator(&self, name: &str) -> Result<Arc<dyn Generator>, RegistryError> {
        read(&self.operations).generator(name)
    }

    pub fn processor(&self, name: &str) -> Result<Arc<dyn Processor>, RegistryError> {
        read(&self.operations).processor(name)
    }

    pub fn set_datastore(&self, datastore: Arc<dyn Datastore>) {
        *write(&self.datastore) = datastore;
    }

    pub fn datastore(&self) -> Arc<dyn Datastore> {
        read(&self.datastore).clone()
    }

    pub async fn store(&self, data: impl Into<Bytes>) -> storage::Result<String> {
        self.datastore().store(data.into()).await
    }

    pub async fn destroy(&self, uid: &str) -> storage::Result<()> {
        self.datastore().destroy(uid).await
    }

    /// Job that loads `uid`; nothing is read until it is applied
    pub fn fetch(self: &Arc<Self>, uid: impl Into<String>) -> Job {
        Job::fetch(self, uid)
    }

    pub fn generate(self: &Arc<Self>, name: impl Into<String>, args: Vec<Arg>) -> Job {
        Job::generate(self, name, args)
    }

    /// Rebuild a job from a token, within this instance's decode limits
    pub fn decode(self: &Arc<Self>, token: &str) -> Result<Job, DecodeError> {
        Job::decode(self, token)
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        read(&self.settings).limits
    }

    /// Path under which this instance serves `job`
    pub fn url_for(&self, job: &Job) -> String {
        let token = job.encode();
        match &read(&self.settings).path_prefix {
            Some(prefix) => format!("{prefix}/{token}"),
            None => format!("/{token}"),
        }
    }

    /// Turn the last step's output into content, resolving its type:
    /// explicit mime type, then format, then the name's extension
    pub(crate) fn resolve_content(&self, processed: Processed) -> Content {
        let table = read(&self.mime_types);
        let mime_type = processed
            .mime_type
            .clone()
            .or_else(|| {
                processed
                    .format
                    .as_deref()
                    .and_then(|format| table.resolve(format))
                    .map(str::to_string)
            })
            .or_else(|| {
                processed
                    .name
                    .as_deref()
                    .and_then(|name| table.resolve_name(name))
                    .map(str::to_string)
            });

        Content {
            data: processed.data,
            mime_type,
            format: processed.format,
            name: processed.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Arc<Instance> {
        Arc::new(Instance::new("images"))
    }

    #[test]
    fn test_mime_type_for_key_forms() {
        let app = instance();
        assert_eq!(app.mime_type_for("png").as_deref(), Some("image/png"));
        assert_eq!(app.mime_type_for("PNG").as_deref(), Some("image/png"));
        assert_eq!(app.mime_type_for(".png").as_deref(), Some("image/png"));
        assert!(app.mime_type_for("mark").is_none());
    }

    #[test]
    fn test_register_mime_type() {
        let app = instance();
        app.register_mime_type("mark", "application/mark");
        app.register_mime_type("png", "ping/pong");

        assert_eq!(app.mime_type_for("mark").as_deref(), Some("application/mark"));
        assert_eq!(app.mime_type_for("png").as_deref(), Some("ping/pong"));
    }

    #[test]
    fn test_configure_rejects_bad_prefix() {
        let app = instance();
        let result = app.configure(|c| c.path_prefix = Some("media/".into()));

        assert!(result.is_err());
        assert_eq!(app.settings().path_prefix, None);
    }

    #[test]
    fn test_url_for_uses_prefix() {
        let app = instance();
        let job = app.fetch("abc");
        assert_eq!(app.url_for(&job), format!("/{}", job.encode()));

        app.configure(|c| c.path_prefix = Some("/media".into())).unwrap();
        assert_eq!(app.url_for(&job), format!("/media/{}", job.encode()));
    }

    #[test]
    fn test_resolve_content_precedence() {
        let app = instance();

        let explicit = Processed::builder()
            .data("x")
            .mime_type("image/webp")
            .format("png")
            .build();
        assert_eq!(app.resolve_content(explicit).content_type(), "image/webp");

        let by_format = Processed::builder().data("x").format("png").name("a.gif").build();
        assert_eq!(app.resolve_content(by_format).content_type(), "image/png");

        let by_name = Processed::builder().data("x").name("a.gif").build();
        assert_eq!(app.resolve_content(by_name).content_type(), "image/gif");

        let unknown = Processed::raw("x");
        assert_eq!(
            app.resolve_content(unknown).content_type(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_store_and_destroy() {
        let app = instance();
        let uid = app.store("HELLO THERE").await.unwrap();

        assert_eq!(app.datastore().fetch(&uid).await.unwrap(), Bytes::from("HELLO THERE"));
        app.destroy(&uid).await.unwrap();
        app.destroy(&uid).await.unwrap();
    }
}
