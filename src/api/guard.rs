use async_trait::async_trait;
use core::future::Future;

use super::context::CallContext;
use crate::{context::Context, dependency::Dependencies, errors::InstantiateErrorKind, injectable::Injectable, scope::Scope};

/// Admission check of a call, runs after the middlewares and before the input is decoded
#[async_trait]
pub trait Guard: Send + Sync {
    /// # Errors
    /// A failure is handled like any other error of the call
    async fn can(&self, context: &CallContext) -> anyhow::Result<bool>;
}

pub type GuardInjectable = Injectable<Box<dyn Guard>>;

/// Guard injectable built by `factory`. Only [`Scope::Global`] guards can be registered.
#[must_use]
pub fn create_guard<G, F, Fut>(dependencies: Dependencies, factory: F) -> GuardInjectable
where
    G: Guard + 'static,
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<G, InstantiateErrorKind>> + Send + 'static,
{
    Injectable::factory(Scope::Global, dependencies, move |context| {
        let guard = factory(context);
        async move { guard.await.map(|guard| Box::new(guard) as Box<dyn Guard>) }
    })
    .with_label("Guard")
}
