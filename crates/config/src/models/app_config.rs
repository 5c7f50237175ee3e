use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{bus::BusConfig, host::HostConfig, logging::LogConfig};
use crate::validation::ConfigValidator;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub bus: BusConfig,
    pub host: HostConfig,
}

impl AppConfig {
    /// Loads defaults, then the TOML file (which must exist when a path is
    /// given), then `ACTIVATOR_` environment overrides such as
    /// `ACTIVATOR_HOST__MAX_CONCURRENT_JOBS=8`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("log.level", defaults.log.level.to_string())?
            .set_default("log.format", defaults.log.format.to_string())?
            .set_default("bus.max_queue_size", defaults.bus.max_queue_size as u64)?
            .set_default("bus.job_queue", defaults.bus.job_queue.clone())?
            .set_default("bus.auto_create_queues", defaults.bus.auto_create_queues)?
            .set_default(
                "host.max_concurrent_jobs",
                defaults.host.max_concurrent_jobs as u64,
            )?
            .set_default("host.jobs", defaults.host.jobs.clone())?;

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/activator.toml", "activator.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ACTIVATOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("host.jobs"),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.log.validate()?;
        self.bus.validate()?;
        self.host.validate()?;
        Ok(())
    }
}
