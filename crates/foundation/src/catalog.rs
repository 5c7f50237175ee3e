use std::collections::HashMap;

use activator_errors::{ActivatorError, ActivatorResult};

use crate::job_type::{JobClass, JobType};

/// Name → job type lookup used by a host that stores jobs by name.
#[derive(Debug, Default, Clone)]
pub struct JobCatalog {
    jobs: HashMap<String, JobType>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its short type name.
    pub fn register<T: JobClass>(&mut self) -> &mut Self {
        let job_type = JobType::of::<T>();
        self.jobs.insert(job_type.short_name().to_string(), job_type);
        self
    }

    pub fn register_as<T: JobClass>(&mut self, name: impl Into<String>) -> &mut Self {
        self.jobs.insert(name.into(), JobType::of::<T>());
        self
    }

    pub fn get(&self, name: &str) -> ActivatorResult<&JobType> {
        self.jobs
            .get(name)
            .ok_or_else(|| ActivatorError::unknown_job(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
