use core::{
    fmt::{self, Debug, Formatter},
    future::Future,
};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, Instrument as _};

use crate::{
    api::CallInjectables,
    container::Container,
    context::Context,
    dependency::{Dependant, Dependencies},
    errors::TaskErrorKind,
    scope::Scope,
};

type TaskHandler = Arc<dyn Fn(Context, Vec<Value>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Named background job with its own dependencies, executed outside of any call
pub struct Task {
    name: String,
    dependencies: Dependencies,
    handler: TaskHandler,
}

impl Task {
    #[must_use]
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Context, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let handler: TaskHandler =
            Arc::new(move |context: Context, args: Vec<Value>| -> BoxFuture<'static, anyhow::Result<Value>> { Box::pin(handler(context, args)) });
        Self {
            name: name.into(),
            dependencies: Dependencies::new(),
            handler,
        }
    }

    /// Task dependencies must be of [`Scope::Global`] effective scope
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }
}

impl Dependant for Task {
    #[inline]
    fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Runs registered tasks, each one in its own [`Scope::Global`] fork of the root container
#[derive(Clone, Debug)]
pub struct Tasks {
    container: Container,
}

impl Tasks {
    #[must_use]
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    /// Spawns the task on the tokio runtime.
    /// The task's container is disposed once the handler finishes, fails or is aborted.
    ///
    /// # Errors
    /// Returns [`TaskErrorKind::NotFound`] if there is no registered task with the name
    pub fn execute(&self, name: &str, args: Vec<Value>) -> Result<TaskExecution, TaskErrorKind> {
        let task = self
            .container
            .registry()
            .task(name)
            .cloned()
            .ok_or_else(|| TaskErrorKind::NotFound { name: name.to_owned() })?;

        let signal = CancellationToken::new();
        let container = self.container.fork(Scope::Global);
        let span = debug_span!("task", name = task.name());
        let handle = tokio::spawn(run(container, task, signal.clone(), args).instrument(span));

        Ok(TaskExecution { signal, handle })
    }
}

async fn run(container: Container, task: Arc<Task>, signal: CancellationToken, args: Vec<Value>) -> Result<Value, TaskErrorKind> {
    container.provide(CallInjectables::task_signal(), signal.clone());

    let result = tokio::select! {
        biased;
        () = signal.cancelled() => Err(TaskErrorKind::Aborted),
        result = execute(&container, &task, args) => result,
    };
    match &result {
        Ok(_) => debug!("Task executed"),
        Err(err) => error!("{err}"),
    }

    container.dispose().await;
    result
}

async fn execute(container: &Container, task: &Task, args: Vec<Value>) -> Result<Value, TaskErrorKind> {
    let context = container.create_context(&task.dependencies).await?;
    (task.handler)(context, args).await.map_err(TaskErrorKind::Handler)
}

/// Handle of a spawned task execution
#[derive(Debug)]
pub struct TaskExecution {
    signal: CancellationToken,
    handle: JoinHandle<Result<Value, TaskErrorKind>>,
}

impl TaskExecution {
    /// Stops the handler and disposes the task's container, [`Self::wait`] returns [`TaskErrorKind::Aborted`]
    pub fn abort(&self) {
        self.signal.cancel();
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// # Errors
    /// Returns the error of the execution
    pub async fn wait(self) -> Result<Value, TaskErrorKind> {
        self.handle.await.map_err(|_| TaskErrorKind::Panicked)?
    }
}
