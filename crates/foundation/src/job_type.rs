use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use activator_domain::{BusHandle, Job};
use activator_errors::{ActivatorResult, JobResult};

use crate::factory::{CompiledFactory, ConstructorResolver};

pub type BusConstructorFn<T> = Arc<dyn Fn(BusHandle) -> JobResult<T> + Send + Sync>;
pub type DefaultConstructorFn<T> = Arc<dyn Fn() -> JobResult<T> + Send + Sync>;

/// A job type that publishes the constructors it can be built with.
///
/// Rust has no constructor reflection, so each job type lists its
/// constructors explicitly. The resolver reads this list once per activator
/// and job type.
pub trait JobClass: Job + Sized {
    fn constructors() -> Constructors<Self>;
}

/// Runtime description of one constructor parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterInfo {
    id: TypeId,
    type_name: &'static str,
}

impl ParameterInfo {
    pub fn of<P: 'static>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            type_name: type_name::<P>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ParameterInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParameterInfo {}

impl fmt::Display for ParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_type_name(self.type_name))
    }
}

/// One declared constructor of a job type.
pub enum Constructor<T> {
    /// `T::new(bus)`.
    WithBus(BusConstructorFn<T>),
    /// `T::new()`.
    Default(DefaultConstructorFn<T>),
    /// Any other signature. Visible to inspection, never invoked.
    Other(Vec<ParameterInfo>),
}

impl<T> Constructor<T> {
    pub fn parameters(&self) -> Vec<ParameterInfo> {
        match self {
            Constructor::WithBus(_) => vec![ParameterInfo::of::<BusHandle>()],
            Constructor::Default(_) => Vec::new(),
            Constructor::Other(parameters) => parameters.clone(),
        }
    }

    /// Human readable signature, e.g. `(i32, String)`.
    pub fn signature(&self) -> String {
        let parameters: Vec<String> = self.parameters().iter().map(|p| p.to_string()).collect();
        format!("({})", parameters.join(", "))
    }
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        match self {
            Constructor::WithBus(ctor) => Constructor::WithBus(Arc::clone(ctor)),
            Constructor::Default(ctor) => Constructor::Default(Arc::clone(ctor)),
            Constructor::Other(parameters) => Constructor::Other(parameters.clone()),
        }
    }
}

/// Constructor table of a job type, in declaration order.
pub struct Constructors<T> {
    entries: Vec<Constructor<T>>,
}

impl<T> Constructors<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_bus<F>(mut self, ctor: F) -> Self
    where
        F: Fn(BusHandle) -> JobResult<T> + Send + Sync + 'static,
    {
        self.entries.push(Constructor::WithBus(Arc::new(ctor)));
        self
    }

    pub fn with_default<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> JobResult<T> + Send + Sync + 'static,
    {
        self.entries.push(Constructor::Default(Arc::new(ctor)));
        self
    }

    pub fn with_params(mut self, parameters: &[ParameterInfo]) -> Self {
        self.entries.push(Constructor::Other(parameters.to_vec()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constructor<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Constructors<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime identifier of a job type, used as the activator's cache key.
#[derive(Clone)]
pub struct JobType {
    id: TypeId,
    type_name: &'static str,
    short_name: Arc<str>,
    compile: fn() -> ActivatorResult<CompiledFactory>,
}

impl JobType {
    pub fn of<T: JobClass>() -> Self {
        let type_name = type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            type_name,
            short_name: short_type_name(type_name).into(),
            compile: ConstructorResolver::compile::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Inspects the type's constructors and compiles a factory for it.
    pub fn compile(&self) -> ActivatorResult<CompiledFactory> {
        (self.compile)()
    }
}

impl PartialEq for JobType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobType {}

impl Hash for JobType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobType")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name)
    }
}

/// Strips module paths from a type name, generic arguments included:
/// `app::jobs::Wrap<app::jobs::ReportJob>` becomes `Wrap<ReportJob>`.
pub fn short_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut segment_start = 0;

    for (index, ch) in full_name.char_indices() {
        if matches!(
            ch,
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*'
        ) {
            push_last_segment(&mut short, &full_name[segment_start..index]);
            short.push(ch);
            segment_start = index + ch.len_utf8();
        }
    }
    push_last_segment(&mut short, &full_name[segment_start..]);

    short
}

fn push_last_segment(out: &mut String, path: &str) {
    out.push_str(path.rsplit("::").next().unwrap_or(path));
}
