use core::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::{
    any::RcAny,
    context::Context,
    errors::InstantiateErrorKind,
    service::{service_fn, BoxCloneService},
};

/// Builds a value of `T` from the resolved dependencies of an injectable.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = Result<T, InstantiateErrorKind>>`.
pub trait Instantiator<T>: Clone + Send + Sync + 'static {
    fn instantiate(&self, context: Context) -> impl Future<Output = Result<T, InstantiateErrorKind>> + Send;
}

impl<F, Fut, T> Instantiator<T> for F
where
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, InstantiateErrorKind>> + Send,
{
    #[inline]
    fn instantiate(&self, context: Context) -> impl Future<Output = Result<T, InstantiateErrorKind>> + Send {
        self(context)
    }
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Context, RcAny, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator<T, Inst>(instantiator: Inst) -> BoxedCloneInstantiator
where
    T: Send + Sync + 'static,
    Inst: Instantiator<T>,
{
    BoxCloneService::new(service_fn(move |context: Context| {
        let instantiator = instantiator.clone();
        async move {
            let dependency = instantiator.instantiate(context).await?;
            debug!("Instantiated");
            Ok::<_, InstantiateErrorKind>(Arc::new(dependency) as RcAny)
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::boxed_instantiator;
    use crate::{any::RcAny, context::Context, errors::InstantiateErrorKind, service::Service as _};

    use std::sync::Arc;
    use tracing_test::traced_test;

    #[derive(Debug)]
    struct Request(u8);

    #[tokio::test]
    #[traced_test]
    async fn test_boxed_instantiator_reads_context() {
        let mut instantiator = boxed_instantiator(|context: Context| async move {
            let id = context.get::<u8>("id")?;
            Ok::<_, InstantiateErrorKind>(Request(*id))
        });

        let context = Context::from_entries([("id", Arc::new(7u8) as RcAny)]);
        let value = instantiator.call(context).await.unwrap();

        assert_eq!(value.downcast::<Request>().unwrap().0, 7);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_boxed_instantiator_error() {
        let mut instantiator = boxed_instantiator(|_: Context| async move {
            Err::<Request, _>(InstantiateErrorKind::from(anyhow::anyhow!("broken")))
        });

        let err = instantiator.call(Context::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }
}
