//! Sample jobs shipped with the demo host.

use activator_domain::{BusHandle, Job, JobResult, Message};
use activator_foundation::{Constructors, JobCatalog, JobClass};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

pub const REPORT_QUEUE: &str = "reports";

/// Publishes a report summary on the message bus.
pub struct ReportJob {
    bus: BusHandle,
}

impl ReportJob {
    pub fn new(bus: BusHandle) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Job for ReportJob {
    async fn perform(&self) -> JobResult<()> {
        let message = Message::new("report.generated", json!({ "report": "daily" }));
        self.bus.publish(REPORT_QUEUE, &message).await?;
        info!(message_id = %message.id, "report published");
        Ok(())
    }
}

impl JobClass for ReportJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_bus(|bus| Ok(ReportJob::new(bus)))
    }
}

/// Housekeeping job that needs nothing injected.
#[derive(Default)]
pub struct CleanupJob;

#[async_trait]
impl Job for CleanupJob {
    async fn perform(&self) -> JobResult<()> {
        info!("cleanup finished");
        Ok(())
    }
}

impl JobClass for CleanupJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_default(|| Ok(CleanupJob))
    }
}

/// Catalog of the jobs the demo host knows by name.
pub fn default_catalog() -> JobCatalog {
    let mut catalog = JobCatalog::new();
    catalog.register::<ReportJob>().register::<CleanupJob>();
    catalog
}
