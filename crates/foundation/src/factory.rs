use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use activator_domain::{BusHandle, JobInstance};
use activator_errors::{ActivatorError, ActivatorResult, JobError, JobResult};
use tracing::debug;

use crate::job_type::{
    short_type_name, BusConstructorFn, Constructor, DefaultConstructorFn, JobClass,
};

/// Which constructor shape a compiled factory invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryStrategy {
    BusConstructor,
    DefaultConstructor,
}

impl fmt::Display for FactoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryStrategy::BusConstructor => write!(f, "bus_constructor"),
            FactoryStrategy::DefaultConstructor => write!(f, "default_constructor"),
        }
    }
}

trait JobFactory: Send + Sync {
    fn create(&self, bus: &BusHandle) -> JobResult<JobInstance>;
}

enum TypedStrategy<T> {
    BusConstructor(BusConstructorFn<T>),
    DefaultConstructor(DefaultConstructorFn<T>),
}

struct TypedJobFactory<T: JobClass> {
    strategy: TypedStrategy<T>,
}

impl<T: JobClass> JobFactory for TypedJobFactory<T> {
    fn create(&self, bus: &BusHandle) -> JobResult<JobInstance> {
        let job = match &self.strategy {
            TypedStrategy::BusConstructor(ctor) => ctor(Arc::clone(bus))?,
            TypedStrategy::DefaultConstructor(ctor) => ctor()?,
        };
        Ok(Box::new(job))
    }
}

/// Reusable construction path for one job type.
///
/// The bus handle is an argument of [`CompiledFactory::activate`] rather than
/// captured state, so a single factory can serve any handle.
pub struct CompiledFactory {
    job_type: String,
    strategy: FactoryStrategy,
    inner: Box<dyn JobFactory>,
}

impl CompiledFactory {
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    pub fn strategy(&self) -> FactoryStrategy {
        self.strategy
    }

    /// Builds a new job instance. Constructor errors and panics come back as
    /// [`ActivatorError::Instantiation`] with the original cause attached.
    pub fn activate(&self, bus: &BusHandle) -> ActivatorResult<JobInstance> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.inner.create(bus)));

        let cause = match outcome {
            Ok(Ok(job)) => return Ok(job),
            Ok(Err(err)) => err,
            Err(payload) => panic_cause("constructor", payload),
        };

        debug!(job_type = %self.job_type, error = %cause, "job constructor failed");
        Err(ActivatorError::instantiation(self.job_type.clone(), cause))
    }
}

impl fmt::Debug for CompiledFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFactory")
            .field("job_type", &self.job_type)
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn panic_cause(origin: &str, payload: Box<dyn Any + Send>) -> JobError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    format!("{origin} panicked: {message}").into()
}

/// Chooses how a job type is constructed.
///
/// A constructor taking only the bus handle always wins; a parameterless one
/// is the fallback. Every other shape is rejected.
pub struct ConstructorResolver;

impl ConstructorResolver {
    pub fn resolve<T: JobClass>() -> ActivatorResult<FactoryStrategy> {
        Self::select::<T>().map(|(strategy, _)| strategy)
    }

    pub fn compile<T: JobClass>() -> ActivatorResult<CompiledFactory> {
        let (strategy, typed) = Self::select::<T>()?;

        Ok(CompiledFactory {
            job_type: short_type_name(std::any::type_name::<T>()),
            strategy,
            inner: Box::new(TypedJobFactory::<T> { strategy: typed }),
        })
    }

    fn select<T: JobClass>() -> ActivatorResult<(FactoryStrategy, TypedStrategy<T>)> {
        let job_type = short_type_name(std::any::type_name::<T>());
        let constructors = panic::catch_unwind(T::constructors).map_err(|payload| {
            let cause = panic_cause("constructor table", payload);
            debug!(job_type = %job_type, error = %cause, "job constructor table failed");
            ActivatorError::instantiation(job_type.clone(), cause)
        })?;

        let bus_ctor = constructors.iter().find_map(|ctor| match ctor {
            Constructor::WithBus(f) => Some(Arc::clone(f)),
            _ => None,
        });
        if let Some(ctor) = bus_ctor {
            debug!(job_type = %job_type, "using bus constructor");
            return Ok((
                FactoryStrategy::BusConstructor,
                TypedStrategy::BusConstructor(ctor),
            ));
        }

        let default_ctor = constructors.iter().find_map(|ctor| match ctor {
            Constructor::Default(f) => Some(Arc::clone(f)),
            _ => None,
        });
        if let Some(ctor) = default_ctor {
            debug!(job_type = %job_type, "using default constructor");
            return Ok((
                FactoryStrategy::DefaultConstructor,
                TypedStrategy::DefaultConstructor(ctor),
            ));
        }

        let declared: Vec<String> = constructors.iter().map(|c| c.signature()).collect();
        debug!(
            job_type = %job_type,
            declared = ?declared,
            "job type has no supported constructor"
        );
        Err(ActivatorError::unsupported_constructor(job_type))
    }
}
