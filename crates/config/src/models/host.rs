use serde::{Deserialize, Serialize};

use crate::validation::ConfigValidator;
use crate::{ConfigError, ConfigResult};

/// Upper bound for `max_concurrent_jobs`.
pub const MAX_CONCURRENT_JOBS: usize = 1024;

/// Settings of the bundled demo host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub max_concurrent_jobs: usize,
    /// Job names to activate and run, in order of submission.
    pub jobs: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            jobs: vec!["ReportJob".to_string(), "CleanupJob".to_string()],
        }
    }
}

impl ConfigValidator for HostConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::Validation(
                "Max concurrent jobs must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_jobs > MAX_CONCURRENT_JOBS {
            return Err(ConfigError::Validation(format!(
                "Max concurrent jobs cannot exceed {MAX_CONCURRENT_JOBS}, got {}",
                self.max_concurrent_jobs
            )));
        }
        if let Some(blank) = self.jobs.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Job names cannot be blank: {blank:?}"
            )));
        }
        Ok(())
    }
}
