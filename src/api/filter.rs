use async_trait::async_trait;
use core::future::Future;

use super::error::ApiError;
use crate::{context::Context, dependency::Dependencies, errors::InstantiateErrorKind, injectable::Injectable, scope::Scope};

/// Converts errors of a registered type into client errors
#[async_trait]
pub trait Filter: Send + Sync {
    /// `None` passes the error to the next matching filter
    async fn catch(&self, error: &anyhow::Error) -> Option<ApiError>;
}

pub type FilterInjectable = Injectable<Box<dyn Filter>>;

/// Filter injectable built by `factory`. Only [`Scope::Global`] filters can be registered.
#[must_use]
pub fn create_filter<T, F, Fut>(dependencies: Dependencies, factory: F) -> FilterInjectable
where
    T: Filter + 'static,
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, InstantiateErrorKind>> + Send + 'static,
{
    Injectable::factory(Scope::Global, dependencies, move |context| {
        let filter = factory(context);
        async move { filter.await.map(|filter| Box::new(filter) as Box<dyn Filter>) }
    })
    .with_label("Filter")
}
