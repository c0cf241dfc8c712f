use bon::Builder;
use bytes::Bytes;

/// Output of a generator or processor
#[derive(Debug, Clone, Builder)]
pub struct Processed {
    #[builder(into)]
    pub data: Bytes,
    /// Explicit content type, wins over `format`
    #[builder(into)]
    pub mime_type: Option<String>,
    /// File extension describing `data`, resolved through the mime table
    #[builder(into)]
    pub format: Option<String>,
    #[builder(into)]
    pub name: Option<String>,
}

impl Processed {
    /// Bytes with no hints attached
    pub fn raw(data: impl Into<Bytes>) -> Self {
        Self::builder().data(data).build()
    }

    /// Fold a later step's output over this one.
    ///
    /// The type hints travel as a pair: if the later step declares either,
    /// both are taken from it.
    pub fn then(self, next: Processed) -> Processed {
        let (mime_type, format) = if next.mime_type.is_some() || next.format.is_some() {
            (next.mime_type, next.format)
        } else {
            (self.mime_type, self.format)
        };

        Processed {
            data: next.data,
            mime_type,
            format,
            name: next.name.or(self.name),
        }
    }
}
