use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use activator_domain::entities::Message;
use activator_domain::messaging::MessageBus;
use activator_errors::{ActivatorError, ActivatorResult};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// 内存消息总线实现
///
/// 每个队列是一个有界的 `VecDeque`，已消费但未确认的消息保存在 in-flight 表中，
/// 适用于单进程部署和测试场景。
#[derive(Debug)]
pub struct InMemoryMessageBus {
    /// 队列存储：队列名 -> 待消费消息
    queues: Arc<RwLock<HashMap<String, Arc<Mutex<VecDeque<Message>>>>>>,
    /// 已投递未确认的消息：消息ID -> 消息
    in_flight: Arc<Mutex<HashMap<String, Message>>>,
    config: InMemoryBusConfig,
}

#[derive(Debug, Clone)]
pub struct InMemoryBusConfig {
    /// 单个队列最大容量（0表示无限制）
    pub max_queue_size: usize,
    /// 发布到不存在的队列时是否自动创建
    pub auto_create_queues: bool,
}

impl Default for InMemoryBusConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
            auto_create_queues: true,
        }
    }
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::with_config(InMemoryBusConfig::default())
    }

    pub fn with_config(config: InMemoryBusConfig) -> Self {
        info!("Creating in-memory message bus with config: {:?}", config);
        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// 未确认消息数量
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub async fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn queue(&self, queue: &str) -> ActivatorResult<Arc<Mutex<VecDeque<Message>>>> {
        if let Some(messages) = self.queues.read().await.get(queue) {
            return Ok(Arc::clone(messages));
        }

        if !self.config.auto_create_queues {
            return Err(ActivatorError::message_bus(format!(
                "Queue '{queue}' not found"
            )));
        }

        self.create_queue(queue).await?;
        self.queues
            .read()
            .await
            .get(queue)
            .cloned()
            .ok_or_else(|| ActivatorError::message_bus(format!("Queue '{queue}' not found")))
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, queue: &str, message: &Message) -> ActivatorResult<()> {
        let messages = self.queue(queue).await?;
        let mut messages = messages.lock().await;

        if self.config.max_queue_size > 0 && messages.len() >= self.config.max_queue_size {
            warn!(
                "Queue '{}' is full ({} messages), rejecting message {}",
                queue,
                messages.len(),
                message.id
            );
            return Err(ActivatorError::message_bus(format!(
                "Queue '{queue}' is full"
            )));
        }

        messages.push_back(message.clone());
        debug!("Published message {} to queue '{}'", message.id, queue);
        Ok(())
    }

    async fn consume(&self, queue: &str) -> ActivatorResult<Vec<Message>> {
        let messages = self.queue(queue).await?;
        let drained: Vec<Message> = messages.lock().await.drain(..).collect();

        if !drained.is_empty() {
            let mut in_flight = self.in_flight.lock().await;
            for message in &drained {
                in_flight.insert(message.id.clone(), message.clone());
            }
            debug!("Consumed {} messages from queue '{}'", drained.len(), queue);
        }

        Ok(drained)
    }

    async fn ack(&self, message_id: &str) -> ActivatorResult<()> {
        match self.in_flight.lock().await.remove(message_id) {
            Some(_) => Ok(()),
            None => Err(ActivatorError::message_bus(format!(
                "Message '{message_id}' is not awaiting acknowledgement"
            ))),
        }
    }

    async fn create_queue(&self, queue: &str) -> ActivatorResult<()> {
        let mut queues = self.queues.write().await;
        if !queues.contains_key(queue) {
            queues.insert(queue.to_string(), Arc::new(Mutex::new(VecDeque::new())));
            info!("Created queue '{}'", queue);
        }
        Ok(())
    }

    async fn queue_size(&self, queue: &str) -> ActivatorResult<u32> {
        match self.queues.read().await.get(queue) {
            Some(messages) => Ok(saturating_queue_size(messages.lock().await.len())),
            None => Ok(0),
        }
    }
}

/// 队列长度超过 `u32::MAX` 时返回 `u32::MAX`
fn saturating_queue_size(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
