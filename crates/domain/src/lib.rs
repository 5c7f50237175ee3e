pub mod entities;
pub mod job;
pub mod messaging;

pub use activator_errors::{ActivatorError, ActivatorResult, JobError, JobResult};
pub use entities::*;
pub use job::*;
pub use messaging::*;
