use core::{any::type_name, future::Future};
use std::sync::Arc;

use crate::{
    any::RcAny,
    context::Context,
    service::{service_fn, BoxCloneService},
};

/// Teardown of a value of `T` with the dependencies its value was instantiated with
pub trait Finalizer<T>: Clone + Send + Sync + 'static {
    fn finalize(&self, dependency: Arc<T>, context: Context) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<F, Fut, T> Finalizer<T> for F
where
    F: Fn(Arc<T>, Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    #[inline]
    fn finalize(&self, dependency: Arc<T>, context: Context) -> impl Future<Output = anyhow::Result<()>> + Send {
        self(dependency, context)
    }
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<(RcAny, Context), (), anyhow::Error>;

#[must_use]
pub(crate) fn boxed_finalizer<T, Fin>(finalizer: Fin) -> BoxedCloneFinalizer
where
    T: Send + Sync + 'static,
    Fin: Finalizer<T>,
{
    BoxCloneService::new(service_fn(move |(dependency, context): (RcAny, Context)| {
        let finalizer = finalizer.clone();
        async move {
            let dependency = dependency
                .downcast::<T>()
                .map_err(|_| anyhow::anyhow!("Failed to downcast value in finalizer, expected `{}`", type_name::<T>()))?;
            finalizer.finalize(dependency, context).await
        }
    }))
}
