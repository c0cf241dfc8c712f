//! Named generators and processors applied by jobs
//!
//! - [`Generator`] produces the first payload of a job from its arguments
//! - [`Processor`] transforms the payload of the previous step
//! - [`OperationRegistry`] maps operation names to implementations; each
//!   instance owns one, fixed at configuration time
//!
//! ```rust,ignore
//! use contentbox::operations::{OperationRegistry, Processed};
//!
//! let mut ops = OperationRegistry::with_defaults();
//! ops.register_processor("thumb", Arc::new(Thumbnailer::new()));
//! ```

mod builtin;
mod registry;
mod traits;
mod types;

pub use builtin::{FormatProcessor, TextGenerator};
pub use registry::{OperationRegistry, RegistryError};
pub use traits::{Generator, OperationError, Processor};
pub use types::Processed;
