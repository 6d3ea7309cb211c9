use core::future::Future;

use super::Service;

#[derive(Clone, Copy)]
pub(crate) struct ServiceFn<F> {
    f: F,
}

#[inline]
#[must_use]
pub(crate) const fn service_fn<F>(f: F) -> ServiceFn<F> {
    ServiceFn { f }
}

impl<F, Fut, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Fut,
    Fut: Future<Output = Result<Response, Error>>,
{
    type Response = Response;
    type Error = Error;
    type Future = Fut;

    #[inline]
    fn call(&mut self, request: Request) -> Self::Future {
        (self.f)(request)
    }
}
