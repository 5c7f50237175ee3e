use std::any::Any;

use activator_errors::JobResult;
use async_trait::async_trait;

/// Object-safe access to the concrete type behind a `dyn Job`.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// A background job instance produced by an activator and run by the host.
#[async_trait]
pub trait Job: AsAny {
    async fn perform(&self) -> JobResult<()>;
}

/// Type-erased job instance handed back to the host scheduler.
pub type JobInstance = Box<dyn Job>;

impl dyn Job {
    pub fn is<T: Job>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Job>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Job>(self: Box<Self>) -> Result<Box<T>, Box<dyn Any + Send + Sync>> {
        self.into_any().downcast::<T>()
    }
}
