//! # Activator Foundation
//!
//! Building blocks that let a host scheduler create job instances whose
//! constructors want the application's message bus.
//!
//! ## Core Responsibilities
//!
//! - **Job type descriptors**: [`JobType`] identifies a job type at runtime and
//!   exposes the constructors it declares through [`JobClass`]
//! - **Constructor resolution**: [`ConstructorResolver`] picks the bus-accepting
//!   constructor, falls back to the parameterless one, and compiles the choice
//!   into a reusable [`CompiledFactory`]
//! - **Activation**: [`BusJobActivator`] implements the host's [`JobActivator`]
//!   extension point and memoizes one compiled factory per job type
//! - **Catalog**: [`JobCatalog`] maps the job names a host stores to job types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use activator_foundation::prelude::*;
//!
//! let activator = BusJobActivator::new(bus);
//! let job = activator.activate_job(&JobType::of::<ReportJob>())?;
//! job.perform().await?;
//! ```

pub mod activator;
pub mod catalog;
pub mod factory;
pub mod job_type;

pub use activator::{BusJobActivator, JobActivator};
pub use activator_domain::{BusHandle, Job, JobInstance, MessageBus};
pub use activator_errors::{ActivatorError, ActivatorResult, JobError, JobResult};
pub use catalog::JobCatalog;
pub use factory::{CompiledFactory, ConstructorResolver, FactoryStrategy};
pub use job_type::{short_type_name, Constructor, Constructors, JobClass, JobType, ParameterInfo};

pub mod prelude {
    pub use crate::activator::*;
    pub use crate::catalog::*;
    pub use crate::factory::*;
    pub use crate::job_type::*;
    pub use activator_domain::{BusHandle, Job, JobInstance, MessageBus};
    pub use activator_errors::{ActivatorError, ActivatorResult, JobError, JobResult};
}
