//! Jobs: lazily evaluated fetch/generate/process pipelines
//!
//! A [`Job`] is only a description. Building one, chaining `process` calls
//! and encoding it into a URL perform no I/O; [`Job::apply`] runs the steps
//! against the owning [`Instance`](crate::instance::Instance).

mod step;

pub use step::{Arg, Step};

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::content::Content;
use crate::instance::Instance;
use crate::operations::{OperationError, Processed, RegistryError};
use crate::serializer::{self, DecodeError};
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("no stored payload for uid {0}")]
    NotFound(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("operation {operation} rejected its arguments: {message}")]
    InvalidArguments { operation: String, message: String },

    #[error("step {index} cannot appear at that position")]
    InvalidSequence { index: usize },

    #[error("backend failure: {0}")]
    Backend(String),
}

impl JobError {
    fn from_operation(operation: &str, err: OperationError) -> Self {
        match err {
            OperationError::InvalidArguments(message) => JobError::InvalidArguments {
                operation: operation.to_string(),
                message,
            },
            OperationError::Failed(message) => JobError::Backend(format!("{operation}: {message}")),
        }
    }
}

impl From<StorageError> for JobError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(uid) => JobError::NotFound(uid),
            other => JobError::Backend(other.to_string()),
        }
    }
}

impl From<RegistryError> for JobError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownOperation(name) => JobError::UnknownOperation(name),
        }
    }
}

#[derive(Clone)]
pub struct Job {
    instance: Arc<Instance>,
    steps: Vec<Step>,
}

impl Job {
    pub fn fetch(instance: &Arc<Instance>, uid: impl Into<String>) -> Self {
        Self {
            instance: instance.clone(),
            steps: vec![Step::Fetch { uid: uid.into() }],
        }
    }

    pub fn generate(instance: &Arc<Instance>, name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            instance: instance.clone(),
            steps: vec![Step::Generate {
                name: name.into(),
                args,
            }],
        }
    }

    /// Rebuild a job from an untrusted token
    pub fn decode(instance: &Arc<Instance>, token: &str) -> Result<Self, DecodeError> {
        let steps = serializer::decode(token, &instance.decode_limits())?;
        Ok(Self {
            instance: instance.clone(),
            steps,
        })
    }

    /// A new job with one more processing step; `self` is left as is
    pub fn process(&self, name: impl Into<String>, args: Vec<Arg>) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(Step::Process {
            name: name.into(),
            args,
        });
        Self {
            instance: self.instance.clone(),
            steps,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// Uid of the fetched payload, for jobs that start from storage
    pub fn uid(&self) -> Option<&str> {
        match self.steps.first() {
            Some(Step::Fetch { uid }) => Some(uid),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        serializer::encode(&self.steps)
    }

    /// URL path at which the owning instance serves this job
    pub fn url(&self) -> String {
        self.instance.url_for(self)
    }

    /// Run every step in order, stopping at the first failure
    pub async fn apply(&self) -> Result<Content, JobError> {
        let (head, rest) = self
            .steps
            .split_first()
            .ok_or(JobError::InvalidSequence { index: 0 })?;

        tracing::debug!(
            instance = %self.instance.name(),
            steps = self.steps.len(),
            "Applying job"
        );

        let mut current = match head {
            Step::Fetch { uid } => Processed::raw(self.instance.datastore().fetch(uid).await?),
            Step::Generate { name, args } => {
                let generator = self.instance.generator(name)?;
                generator
                    .generate(args)
                    .await
                    .map_err(|e| JobError::from_operation(name, e))?
            }
            Step::Process { .. } => return Err(JobError::InvalidSequence { index: 0 }),
        };

        for (offset, step) in rest.iter().enumerate() {
            let Step::Process { name, args } = step else {
                return Err(JobError::InvalidSequence { index: offset + 1 });
            };
            let processor = self.instance.processor(name)?;
            let next = processor
                .process(current.data.clone(), args)
                .await
                .map_err(|e| JobError::from_operation(name, e))?;
            current = current.then(next);
        }

        Ok(self.instance.resolve_content(current))
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("instance", &self.instance.name())
            .field("steps", &self.steps)
            .finish()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance) && self.steps == other.steps
    }
}
