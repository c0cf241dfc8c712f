//! Extension to content-type lookup table

use std::collections::HashMap;

/// Fallback content type when nothing more specific is known
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const BUILTIN: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/vnd.microsoft.icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("ogg", "audio/ogg"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("txt", "text/plain"),
    ("wav", "audio/wav"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Per-instance mime table. Keys are compared after [`normalize`].
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: HashMap<String, String>,
}

/// `"PNG"`, `".png"` and `"png"` all name the same entry
pub fn normalize(key: &str) -> String {
    let key = key.trim();
    key.strip_prefix('.').unwrap_or(key).to_ascii_lowercase()
}

impl MimeTable {
    /// Table with no entries at all
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: impl AsRef<str>, mime_type: impl Into<String>) {
        self.entries.insert(normalize(key.as_ref()), mime_type.into());
    }

    pub fn resolve(&self, key: impl AsRef<str>) -> Option<&str> {
        self.entries
            .get(&normalize(key.as_ref()))
            .map(String::as_str)
    }

    /// Lookup by the extension of a file name, e.g. `photo.JPG`
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        let (_, ext) = name.rsplit_once('.')?;
        self.resolve(ext)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (ext, mime_type) in BUILTIN {
            table.register(ext, *mime_type);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_forms_agree() {
        let table = MimeTable::default();
        assert_eq!(table.resolve("png"), Some("image/png"));
        assert_eq!(table.resolve("PNG"), Some("image/png"));
        assert_eq!(table.resolve(".png"), Some("image/png"));
        assert_eq!(table.resolve(String::from("png")), Some("image/png"));
    }

    #[test]
    fn test_unknown_is_none() {
        assert!(MimeTable::default().resolve("mark").is_none());
        assert!(MimeTable::empty().resolve("png").is_none());
    }

    #[test]
    fn test_register_adds_and_overrides() {
        let mut table = MimeTable::default();
        table.register("mark", "application/mark");
        table.register(".PNG", "ping/pong");

        assert_eq!(table.resolve("mark"), Some("application/mark"));
        assert_eq!(table.resolve("png"), Some("ping/pong"));
    }

    #[test]
    fn test_resolve_name() {
        let table = MimeTable::default();
        assert_eq!(table.resolve_name("photo.JPG"), Some("image/jpeg"));
        assert_eq!(table.resolve_name("archive.tar.gz"), Some("application/gzip"));
        assert!(table.resolve_name("README").is_none());
    }
}
