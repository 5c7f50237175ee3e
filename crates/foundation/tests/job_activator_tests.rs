use std::error::Error as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use activator_domain::Message;
use activator_foundation::prelude::*;
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use tracing_test::traced_test;

mock! {
    pub Bus {}

    #[async_trait]
    impl MessageBus for Bus {
        async fn publish(&self, queue: &str, message: &Message) -> ActivatorResult<()>;
        async fn consume(&self, queue: &str) -> ActivatorResult<Vec<Message>>;
        async fn ack(&self, message_id: &str) -> ActivatorResult<()>;
        async fn create_queue(&self, queue: &str) -> ActivatorResult<()>;
        async fn queue_size(&self, queue: &str) -> ActivatorResult<u32>;
    }
}

/// Needs the bus to publish its report.
struct ReportJob {
    bus: BusHandle,
}

#[async_trait]
impl Job for ReportJob {
    async fn perform(&self) -> JobResult<()> {
        let message = Message::new("report.generated", json!({ "rows": 42 }));
        self.bus.publish("reports", &message).await?;
        Ok(())
    }
}

impl JobClass for ReportJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_bus(|bus| Ok(ReportJob { bus }))
    }
}

/// Parameterless job; never sees the bus.
struct CleanupJob {
    removed: usize,
}

#[async_trait]
impl Job for CleanupJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for CleanupJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_default(|| Ok(CleanupJob { removed: 0 }))
    }
}

static BAD_JOB_INSPECTIONS: AtomicUsize = AtomicUsize::new(0);

/// Only has a `BadJob(i32)` constructor.
struct BadJob {
    _x: i32,
}

#[async_trait]
impl Job for BadJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for BadJob {
    fn constructors() -> Constructors<Self> {
        BAD_JOB_INSPECTIONS.fetch_add(1, Ordering::SeqCst);
        Constructors::new().with_params(&[ParameterInfo::of::<i32>()])
    }
}

struct FailingJob;

#[async_trait]
impl Job for FailingJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for FailingJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_bus(|_bus| {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "smtp relay down").into())
        })
    }
}

static MAILER_JOB_INSPECTIONS: AtomicUsize = AtomicUsize::new(0);

static MAILER_JOB_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

/// Constructor always fails; the table itself is fine.
struct MailerJob;

#[async_trait]
impl Job for MailerJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for MailerJob {
    fn constructors() -> Constructors<Self> {
        MAILER_JOB_INSPECTIONS.fetch_add(1, Ordering::SeqCst);
        Constructors::new().with_bus(|_bus| {
            MAILER_JOB_ATTEMPTS.fetch_add(1, Ordering::SeqCst);
            Err("mailbox quota exceeded".into())
        })
    }
}

static BROKEN_TABLE_INSPECTIONS: AtomicUsize = AtomicUsize::new(0);

/// Panics while listing its constructors.
struct BrokenTableJob;

#[async_trait]
impl Job for BrokenTableJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for BrokenTableJob {
    fn constructors() -> Constructors<Self> {
        BROKEN_TABLE_INSPECTIONS.fetch_add(1, Ordering::SeqCst);
        panic!("static init failed")
    }
}

static COUNTED_JOB_INSPECTIONS: AtomicUsize = AtomicUsize::new(0);

static COUNTED_JOB_INSTANCES: AtomicUsize = AtomicUsize::new(0);

struct CountedJob {
    serial: usize,
}

#[async_trait]
impl Job for CountedJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for CountedJob {
    fn constructors() -> Constructors<Self> {
        COUNTED_JOB_INSPECTIONS.fetch_add(1, Ordering::SeqCst);
        Constructors::new().with_default(|| {
            Ok(CountedJob {
                serial: COUNTED_JOB_INSTANCES.fetch_add(1, Ordering::SeqCst),
            })
        })
    }
}

struct ContendedJob {
    bus: BusHandle,
}

#[async_trait]
impl Job for ContendedJob {
    async fn perform(&self) -> JobResult<()> {
        Ok(())
    }
}

impl JobClass for ContendedJob {
    fn constructors() -> Constructors<Self> {
        Constructors::new().with_bus(|bus| Ok(ContendedJob { bus }))
    }
}

fn idle_bus() -> BusHandle {
    Arc::new(MockBus::new())
}

#[test]
fn test_bus_constructor_receives_stored_handle() {
    let activator = BusJobActivator::new(idle_bus());

    let job = activator.activate_job(&JobType::of::<ReportJob>()).unwrap();
    let report = job.downcast_ref::<ReportJob>().expect("ReportJob instance");

    assert!(Arc::ptr_eq(&report.bus, activator.bus()));
}

#[tokio::test]
async fn test_bus_job_publishes_through_injected_bus() {
    let mut bus = MockBus::new();
    bus.expect_publish()
        .withf(|queue, message| {
            queue.to_string() == "reports" && message.message_type == "report.generated"
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let activator = BusJobActivator::new(Arc::new(bus));
    let job = activator.activate_job(&JobType::of::<ReportJob>()).unwrap();

    job.perform().await.unwrap();
}

#[test]
fn test_default_constructor_leaves_bus_untouched() {
    // no expectations: any call on the mock would panic
    let bus = idle_bus();
    let activator = BusJobActivator::new(Arc::clone(&bus));

    let job = activator.activate_job(&JobType::of::<CleanupJob>()).unwrap();

    assert_eq!(job.downcast_ref::<CleanupJob>().unwrap().removed, 0);
    assert_eq!(Arc::strong_count(&bus), 2);
}

#[test]
fn test_unsupported_constructor_fails_with_type_name() {
    let activator = BusJobActivator::new(idle_bus());

    let err = activator
        .activate_job(&JobType::of::<BadJob>())
        .err()
        .expect("BadJob must not activate");

    assert!(matches!(err, ActivatorError::UnsupportedConstructor { .. }));
    assert!(err.to_string().contains("BadJob"));
    assert_eq!(err.job_type(), Some("BadJob"));
}

#[test]
fn test_failed_resolution_is_retried_from_scratch() {
    let activator = BusJobActivator::new(idle_bus());
    let job_type = JobType::of::<BadJob>();
    let before = BAD_JOB_INSPECTIONS.load(Ordering::SeqCst);

    assert!(activator.activate_job(&job_type).is_err());
    assert!(activator.activate_job(&job_type).is_err());

    assert_eq!(BAD_JOB_INSPECTIONS.load(Ordering::SeqCst) - before, 2);
    assert!(activator.cached_factory(&job_type).is_none());
}

#[test]
fn test_throwing_constructor_wrapped_in_instantiation_error() {
    let activator = BusJobActivator::new(idle_bus());

    let err = activator
        .activate_job(&JobType::of::<FailingJob>())
        .err()
        .expect("FailingJob must not activate");

    assert!(matches!(err, ActivatorError::Instantiation { .. }));
    assert!(err.to_string().contains("FailingJob"));
    let cause = err.source().expect("cause preserved");
    assert_eq!(cause.to_string(), "smtp relay down");
}

#[test]
fn test_instantiation_failure_keeps_compiled_factory() {
    let activator = BusJobActivator::new(idle_bus());
    let job_type = JobType::of::<MailerJob>();

    for _ in 0..2 {
        let err = activator
            .activate_job(&job_type)
            .err()
            .expect("MailerJob must not activate");
        assert!(matches!(err, ActivatorError::Instantiation { .. }));
    }

    assert_eq!(MAILER_JOB_INSPECTIONS.load(Ordering::SeqCst), 1);
    assert_eq!(MAILER_JOB_ATTEMPTS.load(Ordering::SeqCst), 2);
    let factory = activator.cached_factory(&job_type).expect("factory stays cached");
    assert_eq!(factory.strategy(), FactoryStrategy::BusConstructor);
}

#[test]
fn test_panicking_constructor_table_returns_error() {
    let activator = BusJobActivator::new(idle_bus());
    let job_type = JobType::of::<BrokenTableJob>();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        activator.activate_job(&job_type).map(|_| ())
    }));

    let err = outcome
        .expect("panic must not escape activate_job")
        .expect_err("BrokenTableJob must not activate");
    assert!(matches!(err, ActivatorError::Instantiation { .. }));
    assert_eq!(err.job_type(), Some("BrokenTableJob"));
    assert!(err.source().unwrap().to_string().contains("static init failed"));

    // not cached: the next call inspects the type again
    assert!(activator.activate_job(&job_type).is_err());
    assert_eq!(BROKEN_TABLE_INSPECTIONS.load(Ordering::SeqCst), 2);
    assert!(activator.cached_factory(&job_type).is_none());
}

#[test]
fn test_factory_resolved_once_per_type() {
    let activator = BusJobActivator::new(idle_bus());
    let job_type = JobType::of::<CountedJob>();

    let first = activator.activate_job(&job_type).unwrap();
    for _ in 0..4 {
        activator.activate_job(&job_type).unwrap();
    }
    let last = activator.activate_job(&job_type).unwrap();

    assert_eq!(COUNTED_JOB_INSPECTIONS.load(Ordering::SeqCst), 1);
    assert_ne!(
        first.downcast_ref::<CountedJob>().unwrap().serial,
        last.downcast_ref::<CountedJob>().unwrap().serial
    );
    assert_eq!(activator.cached_factories(), 1);
}

#[test]
fn test_concurrent_first_use_converges_on_one_factory() {
    const CALLERS: usize = 16;

    let activator = BusJobActivator::new(idle_bus());
    let job_type = JobType::of::<ContendedJob>();
    let barrier = Barrier::new(CALLERS);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    activator.activate_job(&job_type).map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });

    let settled = activator.cached_factory(&job_type).unwrap();
    for _ in 0..8 {
        let job = activator.activate_job(&job_type).unwrap();
        let contended = job.downcast_ref::<ContendedJob>().unwrap();
        assert!(Arc::ptr_eq(&contended.bus, activator.bus()));
        assert!(Arc::ptr_eq(
            &settled,
            &activator.cached_factory(&job_type).unwrap()
        ));
    }
    assert_eq!(activator.cached_factories(), 1);
    assert_eq!(settled.strategy(), FactoryStrategy::BusConstructor);
}

#[test]
fn test_failure_of_one_type_does_not_affect_others() {
    let activator = BusJobActivator::new(idle_bus());

    assert!(activator.activate_job(&JobType::of::<BadJob>()).is_err());
    assert!(activator.activate_job(&JobType::of::<CleanupJob>()).is_ok());
    assert!(activator.activate_job(&JobType::of::<ReportJob>()).is_ok());

    assert_eq!(activator.cached_factories(), 2);
}

#[test]
#[traced_test]
fn test_activation_is_logged() {
    let activator = BusJobActivator::new(idle_bus());

    activator.activate_job(&JobType::of::<CleanupJob>()).unwrap();
    let _ = activator.activate_job(&JobType::of::<BadJob>());

    assert!(logs_contain("compiled job factory"));
    assert!(logs_contain("default_constructor"));
    assert!(logs_contain("job activation failed"));
}

#[test]
fn test_catalog_lookup_then_activate() {
    let mut catalog = JobCatalog::new();
    catalog.register::<ReportJob>().register::<CleanupJob>();
    let activator = BusJobActivator::new(idle_bus());

    let job = activator
        .activate_job(catalog.get("CleanupJob").unwrap())
        .unwrap();
    assert!(job.is::<CleanupJob>());

    let err = catalog.get("BadJob").unwrap_err();
    assert!(matches!(err, ActivatorError::UnknownJob(_)));
}
