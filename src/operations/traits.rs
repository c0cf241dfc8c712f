use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::types::Processed;
use crate::job::Arg;

/// Operation errors
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("operation failed: {0}")]
    Failed(String),
}

/// Produces a payload from arguments alone (head of a job)
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, args: &[Arg]) -> Result<Processed, OperationError>;
}

/// Transforms the payload produced by the previous step
///
/// Hints left unset on the returned [`Processed`] keep the values from
/// earlier steps.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, input: Bytes, args: &[Arg]) -> Result<Processed, OperationError>;
}
