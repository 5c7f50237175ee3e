use thiserror::Error;

/// Boxed failure raised by a job constructor or by a job body.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum ActivatorError {
    #[error("作业类型没有受支持的构造函数: {job_type}")]
    UnsupportedConstructor { job_type: String },
    #[error("实例化作业类型失败: '{job_type}'")]
    Instantiation {
        job_type: String,
        #[source]
        source: JobError,
    },
    #[error("未注册的作业: {0}")]
    UnknownJob(String),
    #[error("消息总线错误: {0}")]
    MessageBus(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type ActivatorResult<T> = Result<T, ActivatorError>;

impl ActivatorError {
    pub fn unsupported_constructor<S: Into<String>>(job_type: S) -> Self {
        Self::UnsupportedConstructor {
            job_type: job_type.into(),
        }
    }
    pub fn instantiation<S: Into<String>>(job_type: S, source: JobError) -> Self {
        Self::Instantiation {
            job_type: job_type.into(),
            source,
        }
    }
    pub fn unknown_job<S: Into<String>>(name: S) -> Self {
        Self::UnknownJob(name.into())
    }
    pub fn message_bus<S: Into<String>>(msg: S) -> Self {
        Self::MessageBus(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Short name of the job type this error is about, if any.
    pub fn job_type(&self) -> Option<&str> {
        match self {
            ActivatorError::UnsupportedConstructor { job_type }
            | ActivatorError::Instantiation { job_type, .. } => Some(job_type),
            _ => None,
        }
    }

    /// Label used for the `kind` dimension of failure metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ActivatorError::UnsupportedConstructor { .. } => "resolution",
            ActivatorError::Instantiation { .. } => "instantiation",
            ActivatorError::UnknownJob(_) => "unknown_job",
            ActivatorError::MessageBus(_) => "message_bus",
            ActivatorError::Configuration(_) => "configuration",
            ActivatorError::Serialization(_) => "serialization",
            ActivatorError::Internal(_) => "internal",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ActivatorError::Internal(_) | ActivatorError::Configuration(_)
        )
    }

    /// Resolution failures are permanent until the job type changes and
    /// instantiation failures are left to the host's own retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivatorError::MessageBus(_))
    }

    pub fn user_message(&self) -> &str {
        match self {
            ActivatorError::UnsupportedConstructor { .. } => "作业类型无法被激活",
            ActivatorError::Instantiation { .. } => "作业实例创建失败",
            ActivatorError::UnknownJob(_) => "请求的作业不存在",
            ActivatorError::Configuration(_) => "配置有误",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for ActivatorError {
    fn from(err: serde_json::Error) -> Self {
        ActivatorError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ActivatorError {
    fn from(err: anyhow::Error) -> Self {
        ActivatorError::Internal(err.to_string())
    }
}
