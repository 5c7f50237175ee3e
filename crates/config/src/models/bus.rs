use serde::{Deserialize, Serialize};

use crate::validation::ConfigValidator;
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// 单个队列最大容量（0表示无限制）
    pub max_queue_size: usize,
    /// 作业事件发布的队列
    pub job_queue: String,
    pub auto_create_queues: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
            job_queue: "jobs".to_string(),
            auto_create_queues: true,
        }
    }
}

impl ConfigValidator for BusConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.job_queue.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Job queue name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
