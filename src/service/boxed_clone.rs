use futures::future::BoxFuture;

use super::base::{Service, ServiceExt as _};

pub(crate) type BoxCloneServiceInner<Request, Response, Error, Future = BoxFuture<'static, Result<Response, Error>>> =
    Box<dyn CloneService<Request, Response = Response, Error = Error, Future = Future> + Send + Sync>;

/// Type-erased service that can be cloned and shared between threads
pub(crate) struct BoxCloneService<Request, Response, Error>(BoxCloneServiceInner<Request, Response, Error>);

impl<Request, Response, Error> BoxCloneService<Request, Response, Error> {
    pub(crate) fn new<S>(inner: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Send + Sync + Clone + 'static,
        S::Future: Send + 'static,
    {
        BoxCloneService(Box::new(inner.map_future(|f| Box::pin(f) as _)))
    }
}

pub(crate) trait CloneService<Request>: Service<Request> {
    #[must_use]
    fn clone_box(&self) -> BoxCloneServiceInner<Request, Self::Response, Self::Error, Self::Future>;
}

impl<Request, T> CloneService<Request> for T
where
    T: Service<Request> + Send + Sync + Clone + 'static,
{
    #[inline]
    fn clone_box(&self) -> BoxCloneServiceInner<Request, T::Response, T::Error, T::Future> {
        Box::new(self.clone())
    }
}

impl<Request, Response, Error> Clone for BoxCloneService<Request, Response, Error> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl<Request, Response, Error> Service<Request> for BoxCloneService<Request, Response, Error> {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response, Error>>;

    #[inline]
    fn call(&mut self, request: Request) -> Self::Future {
        self.0.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::BoxCloneService;
    use crate::service::{service_fn, Service as _};

    use core::convert::Infallible;

    #[tokio::test]
    async fn test_clone_keeps_behaviour() {
        let mut service = BoxCloneService::new(service_fn(|value: u8| async move { Ok::<_, Infallible>(value * 2) }));
        let mut cloned = service.clone();

        assert_eq!(service.call(2).await, Ok(4));
        assert_eq!(cloned.call(3).await, Ok(6));
    }
}
