//! Byte-level operations every instance starts with

use async_trait::async_trait;
use bytes::Bytes;

use super::traits::{Generator, OperationError, Processor};
use super::types::Processed;
use crate::job::Arg;

fn single_str<'a>(op: &str, args: &'a [Arg]) -> Result<&'a str, OperationError> {
    match args {
        [arg] => arg.as_str().ok_or_else(|| {
            OperationError::InvalidArguments(format!("{op} expects a string argument"))
        }),
        _ => Err(OperationError::InvalidArguments(format!(
            "{op} expects exactly one argument, got {}",
            args.len()
        ))),
    }
}

/// `text(body)`: the UTF-8 bytes of `body` as a `txt` payload
#[derive(Debug, Clone, Copy, Default)]
pub struct TextGenerator;

#[async_trait]
impl Generator for TextGenerator {
    async fn generate(&self, args: &[Arg]) -> Result<Processed, OperationError> {
        let body = single_str("text", args)?;
        Ok(Processed::builder()
            .data(Bytes::copy_from_slice(body.as_bytes()))
            .format("txt")
            .build())
    }
}

/// `format(ext)`: relabels the payload, leaving its bytes untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatProcessor;

#[async_trait]
impl Processor for FormatProcessor {
    async fn process(&self, input: Bytes, args: &[Arg]) -> Result<Processed, OperationError> {
        let ext = single_str("format", args)?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(OperationError::InvalidArguments(format!(
                "format expects an alphanumeric extension, got {ext:?}"
            )));
        }
        Ok(Processed::builder()
            .data(input)
            .format(ext.to_ascii_lowercase())
            .build())
    }
}
