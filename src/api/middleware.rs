use async_trait::async_trait;
use core::future::Future;
use serde_json::Value;

use super::{context::CallContext, pipeline::Chain, response::Response};
use crate::{context::Context, dependency::Dependencies, errors::InstantiateErrorKind, injectable::Injectable, scope::Scope};

/// Wraps the rest of the call: the following middlewares, the guards and the handler
#[async_trait]
pub trait Middleware: Send + Sync {
    /// # Errors
    /// A failure is handled like any other error of the call
    async fn handle(&self, context: &CallContext, next: Next<'_>, payload: Value) -> anyhow::Result<Response>;
}

pub type MiddlewareInjectable = Injectable<Box<dyn Middleware>>;

/// Continuation of the middleware chain
pub struct Next<'a> {
    chain: &'a Chain<'a>,
    index: usize,
    payload: Value,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a Chain<'a>, index: usize, payload: Value) -> Self {
        Self { chain, index, payload }
    }

    /// Payload the current middleware was called with
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Runs the rest of the chain with `payload`, or with the current payload if it's `None`
    ///
    /// # Errors
    /// Returns the error of the rest of the chain
    pub async fn run(self, payload: Option<Value>) -> anyhow::Result<Response> {
        self.chain.run(self.index, payload.unwrap_or(self.payload)).await
    }
}

/// Middleware injectable built by `factory`. Only [`Scope::Global`] middlewares can be registered.
#[must_use]
pub fn create_middleware<M, F, Fut>(dependencies: Dependencies, factory: F) -> MiddlewareInjectable
where
    M: Middleware + 'static,
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<M, InstantiateErrorKind>> + Send + 'static,
{
    Injectable::factory(Scope::Global, dependencies, move |context| {
        let middleware = factory(context);
        async move { middleware.await.map(|middleware| Box::new(middleware) as Box<dyn Middleware>) }
    })
    .with_label("Middleware")
}
