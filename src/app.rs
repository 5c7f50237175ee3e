use std::sync::Arc;

use activator_config::{AppConfig, ConfigValidator};
use activator_domain::{BusHandle, Message, MessageBus};
use activator_foundation::{BusJobActivator, JobActivator, JobCatalog};
use activator_infrastructure::{InMemoryBusConfig, InMemoryMessageBus};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument};

use crate::jobs::{default_catalog, REPORT_QUEUE};

/// 一次运行的结果统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// 演示用的宿主程序：按名称查找作业类型，激活并执行
pub struct Application {
    config: AppConfig,
    bus: Arc<InMemoryMessageBus>,
    activator: Arc<BusJobActivator>,
    catalog: Arc<JobCatalog>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self::with_catalog(config, default_catalog())
    }

    pub fn with_catalog(config: AppConfig, catalog: JobCatalog) -> Self {
        let bus = Arc::new(InMemoryMessageBus::with_config(InMemoryBusConfig {
            max_queue_size: config.bus.max_queue_size,
            auto_create_queues: config.bus.auto_create_queues,
        }));
        let handle: BusHandle = bus.clone();
        let activator = Arc::new(BusJobActivator::new(handle));

        info!(
            jobs = ?catalog.job_names(),
            max_concurrent_jobs = config.host.max_concurrent_jobs,
            "初始化作业宿主"
        );

        Self {
            config,
            bus,
            activator,
            catalog: Arc::new(catalog),
        }
    }

    pub fn bus(&self) -> &Arc<InMemoryMessageBus> {
        &self.bus
    }

    pub fn activator(&self) -> &Arc<BusJobActivator> {
        &self.activator
    }

    /// 依次提交配置中的作业，最多 `max_concurrent_jobs` 个同时执行。
    /// 每个作业结束后在 `bus.job_queue` 上发布一条 `job.completed` 消息。
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate().context("宿主配置无效")?;

        self.bus
            .create_queue(&self.config.bus.job_queue)
            .await
            .context("创建作业队列失败")?;

        let semaphore = Arc::new(Semaphore::new(self.config.host.max_concurrent_jobs));
        let mut handles = Vec::with_capacity(self.config.host.jobs.len());

        for name in self.config.host.jobs.iter().cloned() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("作业并发控制信号量已关闭")?;
            let catalog = Arc::clone(&self.catalog);
            let activator = Arc::clone(&self.activator);
            let bus = Arc::clone(&self.bus);
            let job_queue = self.config.bus.job_queue.clone();
            let span = info_span!("run_job", job = %name);

            handles.push(tokio::spawn(
                async move {
                    let _permit = permit;
                    let outcome = run_job(&catalog, activator.as_ref(), &name).await;
                    if let Err(e) = &outcome {
                        error!(job = %name, "作业失败: {e:#}");
                    }

                    let status = Message::new(
                        "job.completed",
                        json!({ "job": name, "succeeded": outcome.is_ok() }),
                    );
                    if let Err(e) = bus.publish(&job_queue, &status).await {
                        warn!(job = %name, "发布作业状态失败: {e}");
                    }

                    outcome.is_ok()
                }
                .instrument(span),
            ));
        }

        let mut summary = RunSummary::default();
        for result in join_all(handles).await {
            match result {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    warn!("作业任务异常退出: {e}");
                    summary.failed += 1;
                }
            }
        }

        let published = self
            .bus
            .queue_size(REPORT_QUEUE)
            .await
            .context("读取报表队列大小失败")?;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            cached_factories = self.activator.cached_factories(),
            reports_published = published,
            "作业运行完成"
        );

        Ok(summary)
    }
}

async fn run_job(catalog: &JobCatalog, activator: &dyn JobActivator, name: &str) -> Result<()> {
    let job_type = catalog.get(name)?;
    let job = activator
        .activate_job(job_type)
        .with_context(|| format!("激活作业失败: {name}"))?;

    job.perform()
        .await
        .map_err(|e| anyhow::anyhow!("执行作业失败: {name}: {e}"))?;

    info!(job = %name, "作业执行成功");
    Ok(())
}
