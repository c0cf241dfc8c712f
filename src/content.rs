use bytes::Bytes;

use crate::mime::DEFAULT_MIME_TYPE;

/// Result of applying a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub data: Bytes,
    /// Resolved content type, if any step or hint determined one
    pub mime_type: Option<String>,
    /// Extension hint the last typed step declared
    pub format: Option<String>,
    pub name: Option<String>,
}

impl Content {
    /// Content type to send, falling back to `application/octet-stream`
    pub fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
