use std::sync::Arc;

use activator_errors::ActivatorResult;
use async_trait::async_trait;

use crate::entities::Message;

/// Interface for message bus operations
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, queue: &str, message: &Message) -> ActivatorResult<()>;
    async fn consume(&self, queue: &str) -> ActivatorResult<Vec<Message>>;
    async fn ack(&self, message_id: &str) -> ActivatorResult<()>;
    async fn create_queue(&self, queue: &str) -> ActivatorResult<()>;
    async fn queue_size(&self, queue: &str) -> ActivatorResult<u32>;
}

/// Shared handle to the application's message bus. Owned by the application
/// wiring code and injected into job constructors that ask for it.
pub type BusHandle = Arc<dyn MessageBus>;
