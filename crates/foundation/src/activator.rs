use std::any::TypeId;
use std::sync::Arc;

use activator_domain::{BusHandle, JobInstance};
use activator_errors::ActivatorResult;
use dashmap::DashMap;
use metrics::counter;
use tracing::{debug, error, info};

use crate::factory::CompiledFactory;
use crate::job_type::JobType;

/// Extension point through which a host scheduler obtains job instances.
pub trait JobActivator: Send + Sync {
    fn activate_job(&self, job_type: &JobType) -> ActivatorResult<JobInstance>;
}

/// Activator that hands the application's message bus to every job whose
/// constructor asks for it.
///
/// One [`CompiledFactory`] is kept per job type for the activator's lifetime.
/// Concurrent first use of a type may compile more than once, but only the
/// first factory inserted is retained and every later lookup observes it.
/// Failed compilations are never cached.
pub struct BusJobActivator {
    bus: BusHandle,
    factories: DashMap<TypeId, Arc<CompiledFactory>>,
}

impl BusJobActivator {
    pub fn new(bus: BusHandle) -> Self {
        Self {
            bus,
            factories: DashMap::new(),
        }
    }

    pub fn bus(&self) -> &BusHandle {
        &self.bus
    }

    /// The factory currently cached for `job_type`, if it was activated before.
    pub fn cached_factory(&self, job_type: &JobType) -> Option<Arc<CompiledFactory>> {
        self.factories
            .get(&job_type.id())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn cached_factories(&self) -> usize {
        self.factories.len()
    }

    fn factory_for(&self, job_type: &JobType) -> ActivatorResult<Arc<CompiledFactory>> {
        if let Some(factory) = self.cached_factory(job_type) {
            debug!(job_type = %job_type, "job factory cache hit");
            return Ok(factory);
        }

        debug!(job_type = %job_type, "job factory cache miss, compiling");
        let compiled = Arc::new(job_type.compile()?);

        let factory = Arc::clone(
            self.factories
                .entry(job_type.id())
                .or_insert_with(|| {
                    counter!("job_factory_compilations_total").increment(1);
                    info!(
                        job_type = %job_type,
                        strategy = %compiled.strategy(),
                        "compiled job factory"
                    );
                    Arc::clone(&compiled)
                })
                .value(),
        );

        Ok(factory)
    }
}

impl JobActivator for BusJobActivator {
    fn activate_job(&self, job_type: &JobType) -> ActivatorResult<JobInstance> {
        let result = self
            .factory_for(job_type)
            .and_then(|factory| factory.activate(&self.bus));

        match &result {
            Ok(_) => {
                counter!("job_activations_total").increment(1);
            }
            Err(e) => {
                counter!("job_activation_failures_total", "kind" => e.kind()).increment(1);
                error!(job_type = %job_type, error = %e, "job activation failed");
            }
        }

        result
    }
}
