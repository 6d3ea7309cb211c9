use core::{
    fmt::{self, Debug, Formatter},
    future::Future,
    time::Duration,
};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use super::{codec::Codec, guard::GuardInjectable, middleware::MiddlewareInjectable, response::Response};
use crate::{
    context::Context,
    dependency::{Dependant, Dependencies},
};

pub(crate) type AsyncHandler = Arc<dyn Fn(Context, Value) -> BoxFuture<'static, anyhow::Result<Response>> + Send + Sync>;
pub(crate) type SyncHandler = Arc<dyn Fn(Context, Value) -> anyhow::Result<Response> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Handler {
    /// Raced against the call timeout
    Async(AsyncHandler),
    /// Runs to completion, the call timeout doesn't apply
    Sync(SyncHandler),
}

/// Named remote operation
pub struct Procedure {
    name: String,
    dependencies: Dependencies,
    guards: Vec<GuardInjectable>,
    middlewares: Vec<MiddlewareInjectable>,
    input: Option<Arc<dyn Codec>>,
    output: Option<Arc<dyn Codec>>,
    stream: bool,
    timeout: Option<Duration>,
    handler: Handler,
}

impl Procedure {
    /// Procedure with an async handler receiving the resolved dependencies and the decoded input
    #[must_use]
    pub fn new<F, Fut, R>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Response>,
    {
        let handler: AsyncHandler = Arc::new(move |context: Context, input: Value| -> BoxFuture<'static, anyhow::Result<Response>> {
            let response = handler(context, input);
            Box::pin(async move { response.await.map(Into::into) })
        });
        Self::with_handler(name.into(), Handler::Async(handler))
    }

    #[must_use]
    pub fn new_sync<F, R>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Context, Value) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Response>,
    {
        let handler: SyncHandler =
            Arc::new(move |context: Context, input: Value| -> anyhow::Result<Response> { handler(context, input).map(Into::into) });
        Self::with_handler(name.into(), Handler::Sync(handler))
    }

    fn with_handler(name: String, handler: Handler) -> Self {
        Self {
            name,
            dependencies: Dependencies::new(),
            guards: Vec::new(),
            middlewares: Vec::new(),
            input: None,
            output: None,
            stream: false,
            timeout: None,
            handler,
        }
    }

    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }

    #[must_use]
    pub fn with_guard(mut self, guard: &GuardInjectable) -> Self {
        self.guards.push(guard.clone());
        self
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: &MiddlewareInjectable) -> Self {
        self.middlewares.push(middleware.clone());
        self
    }

    /// Without an input codec the handler receives `null`
    #[must_use]
    pub fn with_input(mut self, codec: impl Codec + 'static) -> Self {
        self.input = Some(Arc::new(codec));
        self
    }

    /// Without an output codec the call has no output
    #[must_use]
    pub fn with_output(mut self, codec: impl Codec + 'static) -> Self {
        self.output = Some(Arc::new(codec));
        self
    }

    /// The handler must return an [`super::IterableResponse`]
    #[must_use]
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn guards(&self) -> &[GuardInjectable] {
        &self.guards
    }

    #[inline]
    #[must_use]
    pub fn middlewares(&self) -> &[MiddlewareInjectable] {
        &self.middlewares
    }

    #[inline]
    #[must_use]
    pub fn input(&self) -> Option<&dyn Codec> {
        self.input.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn output(&self) -> Option<&dyn Codec> {
        self.output.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.stream
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[inline]
    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl Dependant for Procedure {
    #[inline]
    fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }
}

impl Debug for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("stream", &self.stream)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
